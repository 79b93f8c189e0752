//! Command-line resolver: `resolve-profile [--news] <full name> [organization]`
//! or `resolve-profile --url <profile url>`. Prints JSON on stdout, logs on stderr.

use std::sync::Arc;

use profile_resolver::briefing::{compose_briefing, BriefingInput, DisabledClient, ProfileSummary};
use profile_resolver::config::ResolverConfig;
use profile_resolver::news::{collect_company_news, collect_news, providers_from_env};
use profile_resolver::profile_url::candidate_from_url;
use profile_resolver::{HttpFetcher, RelevanceScorer, ResolveError, Resolver};
use serde_json::json;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "usage: resolve-profile [--news] <full name> [organization]\n       resolve-profile --url <profile url>";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("resolver=info,news=info,briefing=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; picks up *_PATH overrides and NEWS_API_KEY.
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("--url") {
        let Some(url) = args.get(1) else {
            anyhow::bail!(USAGE);
        };
        let cfg = ResolverConfig::from_toml()?;
        let out = match candidate_from_url(url, &cfg.profile) {
            Ok(c) => json!({
                "valid": true,
                "url": c.raw,
                "identifier": c.canonical,
                "origin": c.origin,
            }),
            Err(e) => json!({ "valid": false, "error": e.to_string() }),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let with_news = args.first().map(String::as_str) == Some("--news");
    if with_news {
        args.remove(0);
    }
    let Some(name) = args.first().cloned() else {
        anyhow::bail!(USAGE);
    };
    let organization = args.get(1).cloned();

    let cfg = ResolverConfig::from_toml()?;
    let fetcher = Arc::new(HttpFetcher::new(cfg.call_timeout())?);
    let resolver = Resolver::from_env(fetcher.clone())?;

    let resolved = resolver.resolve_name(&name, organization.as_deref()).await;
    let profile = match &resolved {
        Ok(r) => json!({
            "identifier": r.canonical(),
            "profile_url": resolver.profile_url(r.canonical()),
            "origin": r.identifier.origin,
            "status": r.status,
            "title": r.identifier.title,
            "organization": r.identifier.organization,
        }),
        Err(ResolveError::AmbiguousCandidate { best_guess }) => json!({
            "error": "ambiguous",
            "unvalidated": true,
            "best_guess": best_guess.canonical,
            "profile_url": resolver.profile_url(&best_guess.canonical),
        }),
        Err(e) => json!({ "error": e.to_string() }),
    };

    let mut out = json!({ "profile": profile });

    if with_news {
        let scorer = RelevanceScorer::from_toml()?;
        let providers = providers_from_env(fetcher);
        let org = organization.clone().unwrap_or_default();
        let news = collect_news(&providers, &scorer, &name, &org).await;

        let resolved_candidate = resolved.as_ref().ok().map(|r| &r.identifier);
        let profile = ProfileSummary::for_candidate(&name, &org, resolved_candidate);
        let company_news = collect_company_news(&providers, &scorer, &profile.company).await;

        let input = BriefingInput {
            profile,
            news: news.clone(),
            meeting_context: String::new(),
        };
        let briefing = compose_briefing(&DisabledClient, &input).await;
        out["news"] = serde_json::to_value(&news)?;
        out["company_news"] = serde_json::to_value(&company_news)?;
        out["briefing"] = serde_json::to_value(&briefing)?;
    }

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
