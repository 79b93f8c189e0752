//! # Nickname equivalence
//!
//! Given-name tokens that are interchangeable ("david" / "dave").
//!
//! - Loads from a JSON map `token -> [members]`; the declared relation may be one-sided.
//! - Classes are the connected components of the relation, so every lookup is symmetric.
//! - Lookups are case-insensitive; unknown tokens are their own singleton class.
//! - Falls back to the embedded `config/nicknames.json` seed.

use anyhow::Context;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::{fs, path::Path};
use tracing::warn;

pub const ENV_NICKNAMES_PATH: &str = "NICKNAMES_PATH";

const SEED_JSON: &str = include_str!("../config/nicknames.json");

#[derive(Debug, Clone, Default)]
pub struct EquivalenceTable {
    index: HashMap<String, usize>,
    classes: Vec<Vec<String>>,
}

impl EquivalenceTable {
    /// Build from a (possibly asymmetric) relation.
    pub fn from_relation<I, K, V, S>(relation: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parent: HashMap<String, String> = HashMap::new();

        for (key, members) in relation {
            let k = normalize_token(key.as_ref());
            if k.is_empty() {
                continue;
            }
            for m in members {
                let m = normalize_token(m.as_ref());
                if m.is_empty() || m == k {
                    continue;
                }
                let rk = find(&mut parent, &k);
                let rm = find(&mut parent, &m);
                if rk != rm {
                    parent.insert(rk, rm);
                }
            }
        }

        let all: Vec<String> = parent.keys().cloned().collect();
        let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for token in all {
            let root = find(&mut parent, &token);
            groups.entry(root).or_default().insert(token);
        }

        let mut index = HashMap::new();
        let mut classes = Vec::new();
        for members in groups.into_values() {
            if members.len() < 2 {
                continue;
            }
            let id = classes.len();
            for m in &members {
                index.insert(m.clone(), id);
            }
            classes.push(members.into_iter().collect());
        }

        Self { index, classes }
    }

    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let raw: HashMap<String, Vec<String>> =
            serde_json::from_str(s).context("parsing nickname table json")?;
        Ok(Self::from_relation(raw))
    }

    /// Load from a JSON file. Falls back to `default_seed()` on error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|s| Self::from_json_str(&s))
        {
            Ok(t) => t,
            Err(e) => {
                warn!(target: "nicknames", error = ?e, path = %path.display(), "using seed nickname table");
                Self::default_seed()
            }
        }
    }

    /// `$NICKNAMES_PATH` when set, otherwise the embedded seed.
    pub fn from_env() -> Self {
        match std::env::var(ENV_NICKNAMES_PATH) {
            Ok(p) => Self::load_from_file(p),
            Err(_) => Self::default_seed(),
        }
    }

    /// Built-in seed of common English given-name short forms.
    pub fn default_seed() -> Self {
        Self::from_json_str(SEED_JSON).expect("embedded nickname seed")
    }

    /// The token followed by its other class members (sorted). Never empty.
    pub fn class_of(&self, token: &str) -> Vec<String> {
        let t = normalize_token(token);
        let mut out = vec![t.clone()];
        if let Some(&id) = self.index.get(&t) {
            out.extend(self.classes[id].iter().filter(|m| **m != t).cloned());
        }
        out
    }

    pub fn are_equivalent(&self, a: &str, b: &str) -> bool {
        let (a, b) = (normalize_token(a), normalize_token(b));
        if a == b {
            return true;
        }
        matches!((self.index.get(&a), self.index.get(&b)), (Some(x), Some(y)) if x == y)
    }

    pub fn classes(&self) -> &[Vec<String>] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

fn normalize_token(s: &str) -> String {
    s.trim().to_lowercase()
}

fn find(parent: &mut HashMap<String, String>, token: &str) -> String {
    let mut cur = token.to_string();
    loop {
        let next = parent
            .entry(cur.clone())
            .or_insert_with(|| cur.clone())
            .clone();
        if next == cur {
            return cur;
        }
        cur = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_loads_and_is_symmetric() {
        let t = EquivalenceTable::default_seed();
        assert!(!t.is_empty());
        for class in t.classes() {
            assert!(class.len() >= 2);
            for a in class {
                for b in class {
                    assert!(t.are_equivalent(a, b), "{a} ~ {b}");
                    assert!(t.are_equivalent(b, a), "{b} ~ {a}");
                }
            }
        }
    }

    #[test]
    fn one_sided_source_is_symmetrized() {
        let t = EquivalenceTable::from_relation([("David", vec!["dave"])]);
        assert_eq!(t.class_of("dave"), vec!["dave", "david"]);
        assert_eq!(t.class_of("DAVID"), vec!["david", "dave"]);
    }

    #[test]
    fn shared_member_merges_classes() {
        let t = EquivalenceTable::default_seed();
        assert_eq!(t.class_of("steve"), vec!["steve", "stephen", "steven"]);
        assert!(t.are_equivalent("stephen", "steven"));
    }

    #[test]
    fn unknown_token_is_singleton() {
        let t = EquivalenceTable::default_seed();
        assert_eq!(t.class_of("Zbigniew"), vec!["zbigniew"]);
        assert!(!t.are_equivalent("zbigniew", "david"));
    }

    #[test]
    fn self_and_empty_entries_create_no_class() {
        let t = EquivalenceTable::from_relation([("frank", vec!["frank", ""]), ("", vec!["x"])]);
        assert!(t.is_empty());
        assert_eq!(t.class_of("frank"), vec!["frank"]);
    }

    #[test]
    fn missing_file_falls_back_to_seed() {
        let t = EquivalenceTable::load_from_file("__no_such_nicknames__.json");
        assert!(t.are_equivalent("william", "bill"));
    }
}
