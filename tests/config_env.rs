// tests/config_env.rs
// Environment path overrides and seed fallbacks for every loader.

use std::sync::Arc;
use std::{env, fs};

use profile_resolver::config::{ResolverConfig, ENV_RESOLVER_CONFIG_PATH};
use profile_resolver::extract::selectors::{SelectorSet, ENV_SELECTORS_PATH};
use profile_resolver::identity_table::{IdentityTable, ENV_IDENTITY_TABLE_PATH};
use profile_resolver::nicknames::{EquivalenceTable, ENV_NICKNAMES_PATH};
use profile_resolver::relevance::{ENV_RELEVANCE_CONFIG_PATH, ENV_RELEVANCE_THRESHOLD};
use profile_resolver::{RelevanceScorer, Resolver, ScriptedFetcher};

fn clear_all() {
    for k in [
        ENV_RESOLVER_CONFIG_PATH,
        ENV_SELECTORS_PATH,
        ENV_IDENTITY_TABLE_PATH,
        ENV_NICKNAMES_PATH,
        ENV_RELEVANCE_CONFIG_PATH,
        ENV_RELEVANCE_THRESHOLD,
    ] {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn resolver_config_from_env_path() {
    clear_all();
    let embedded = ResolverConfig::from_toml().unwrap();
    assert_eq!(embedded.limits.validate_top_n, 3);

    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("resolver.toml");
    let custom = include_str!("../config/resolver.toml")
        .replace("validate_top_n = 3", "validate_top_n = 1")
        .replace("call_timeout_ms = 15000", "call_timeout_ms = 500");
    fs::write(&p, custom).unwrap();

    env::set_var(ENV_RESOLVER_CONFIG_PATH, &p);
    let cfg = ResolverConfig::from_toml().unwrap();
    assert_eq!(cfg.limits.validate_top_n, 1);
    assert_eq!(cfg.call_timeout().as_millis(), 500);

    // An explicit path that cannot be read is an error, not a silent default.
    env::set_var(ENV_RESOLVER_CONFIG_PATH, dir.path().join("missing.toml"));
    assert!(ResolverConfig::from_toml().is_err());
    clear_all();
}

#[serial_test::serial]
#[test]
fn relevance_config_and_threshold_override() {
    clear_all();
    assert_eq!(RelevanceScorer::from_toml().unwrap().threshold(), 10);

    env::set_var(ENV_RELEVANCE_THRESHOLD, "25");
    assert_eq!(RelevanceScorer::from_toml().unwrap().threshold(), 25);

    env::set_var(ENV_RELEVANCE_THRESHOLD, "-4");
    assert_eq!(RelevanceScorer::from_toml().unwrap().threshold(), 0);

    env::set_var(ENV_RELEVANCE_THRESHOLD, "not a number");
    assert_eq!(RelevanceScorer::from_toml().unwrap().threshold(), 10);

    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("relevance.toml");
    fs::write(
        &p,
        include_str!("../config/relevance.toml").replace("threshold = 10", "threshold = 3"),
    )
    .unwrap();
    env::remove_var(ENV_RELEVANCE_THRESHOLD);
    env::set_var(ENV_RELEVANCE_CONFIG_PATH, &p);
    assert_eq!(RelevanceScorer::from_toml().unwrap().threshold(), 3);
    clear_all();
}

#[serial_test::serial]
#[test]
fn tables_load_from_env_or_fall_back_to_seed() {
    clear_all();
    let dir = tempfile::tempdir().unwrap();

    let ids = dir.path().join("identities.json");
    fs::write(
        &ids,
        r#"{"entries":[{"name":"Jane Doe","organization":"Initech","identifier":"jane-doe-initech"}]}"#,
    )
    .unwrap();
    env::set_var(ENV_IDENTITY_TABLE_PATH, &ids);
    let t = IdentityTable::from_env();
    assert_eq!(t.len(), 1);
    assert_eq!(t.lookup("jane doe", "initech").map(|(id, _)| id), Some("jane-doe-initech"));

    let nick = dir.path().join("nicknames.json");
    fs::write(&nick, r#"{"margaret": ["peggy", "maggie"]}"#).unwrap();
    env::set_var(ENV_NICKNAMES_PATH, &nick);
    let n = EquivalenceTable::from_env();
    assert!(n.are_equivalent("peggy", "maggie"));
    assert!(!n.are_equivalent("william", "bill"));

    // Malformed files fall back to the seeds.
    fs::write(&ids, "{ not json").unwrap();
    assert!(IdentityTable::from_env().len() > 1);
    fs::write(&nick, "[]").unwrap();
    assert!(EquivalenceTable::from_env().are_equivalent("william", "bill"));
    clear_all();
}

#[serial_test::serial]
#[test]
fn selector_set_from_env() {
    clear_all();
    let seed = SelectorSet::from_env();
    assert!(!seed.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("selectors.toml");
    fs::write(
        &p,
        r#"
version = "2099-01"

[[selectors]]
id = "card_link"
tag = "div"
attr = "data-profile"
contains = "linkedin.com/in/"
"#,
    )
    .unwrap();
    env::set_var(ENV_SELECTORS_PATH, &p);
    let s = SelectorSet::from_env();
    assert_eq!(s.version(), "2099-01");
    assert_eq!(s.ids().collect::<Vec<_>>(), vec!["card_link"]);
    clear_all();
}

#[serial_test::serial]
#[tokio::test(start_paused = true)]
async fn resolver_from_env_uses_overridden_table() {
    clear_all();
    let dir = tempfile::tempdir().unwrap();
    let ids = dir.path().join("identities.json");
    fs::write(
        &ids,
        r#"{"entries":[{"name":"Jane Doe","organization":"","identifier":"jane-doe-initech"}]}"#,
    )
    .unwrap();
    env::set_var(ENV_IDENTITY_TABLE_PATH, &ids);

    let fetcher = Arc::new(ScriptedFetcher::new());
    let resolver = Resolver::from_env(fetcher.clone()).unwrap();
    let r = resolver.resolve_name("Jane Doe", Some("Initech")).await.unwrap();
    assert_eq!(r.canonical(), "jane-doe-initech");
    assert_eq!(fetcher.call_count(), 0);
    clear_all();
}
