//! # Static identity table
//!
//! Pre-vetted `(name, organization) -> identifier` mapping consulted before any
//! network strategy. Entries found here are trusted unconditionally.
//!
//! - Loads from JSON (`{"entries": [{name, organization, identifier}, ...]}`).
//! - Case-insensitive lookup with whitespace/punctuation normalization.
//! - Fallback order: exact `(name, org)` → `(name, "")` → partial organization match.
//! - Includes a built-in seed (`config/identities.json`) of public executives.

use serde::Deserialize;
use std::collections::HashMap;
use std::{fs, path::Path};
use tracing::warn;

pub const ENV_IDENTITY_TABLE_PATH: &str = "IDENTITY_TABLE_PATH";

const SEED_JSON: &str = include_str!("../config/identities.json");

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEntry {
    pub name: String,
    #[serde(default)]
    pub organization: String,
    /// Canonical profile identifier (path slug).
    pub identifier: String,
}

#[derive(Debug, Deserialize)]
struct IdentityFile {
    #[serde(default)]
    entries: Vec<IdentityEntry>,
}

/// Which lookup step produced a hit. Exposed so callers/tests can pin precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Exact,
    NameOnly,
    PartialOrganization,
}

#[derive(Debug, Clone, Default)]
pub struct IdentityTable {
    entries: Vec<IdentityEntry>,
    exact: HashMap<(String, String), usize>,
}

impl IdentityTable {
    pub fn new(entries: Vec<IdentityEntry>) -> Self {
        let mut exact = HashMap::new();
        let mut kept = Vec::with_capacity(entries.len());
        for e in entries {
            let name = normalize(&e.name);
            let identifier = e.identifier.trim().to_ascii_lowercase();
            if name.is_empty() || identifier.is_empty() {
                continue;
            }
            let organization = normalize(&e.organization);
            // First entry wins on duplicate keys.
            exact
                .entry((name.clone(), organization.clone()))
                .or_insert(kept.len());
            kept.push(IdentityEntry {
                name,
                organization,
                identifier,
            });
        }
        Self {
            entries: kept,
            exact,
        }
    }

    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let file: IdentityFile = serde_json::from_str(s)?;
        Ok(Self::new(file.entries))
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
                warn!(target: "identity_table", error = ?e, path = %path.display(), "using seed identity table");
                Self::default_seed()
            }
        }
    }

    /// `$IDENTITY_TABLE_PATH` when set, otherwise the embedded seed.
    pub fn from_env() -> Self {
        match std::env::var(ENV_IDENTITY_TABLE_PATH) {
            Ok(p) => Self::load_from_file(p),
            Err(_) => Self::default_seed(),
        }
    }

    pub fn default_seed() -> Self {
        Self::from_json_str(SEED_JSON).expect("embedded identity seed")
    }

    /// Look up an identifier.
    ///
    /// Steps:
    /// 1. Exact `(name, organization)`.
    /// 2. `(name, "")`.
    /// 3. Same name, stored organization contained in the queried one or vice versa
    ///    (first in table order).
    pub fn lookup(&self, name: &str, organization: &str) -> Option<(&str, LookupKind)> {
        let n = normalize(name);
        let o = normalize(organization);
        if n.is_empty() {
            return None;
        }

        // 1) Exact.
        if let Some(&i) = self.exact.get(&(n.clone(), o.clone())) {
            return Some((self.entries[i].identifier.as_str(), LookupKind::Exact));
        }

        // 2) Name only.
        if let Some(&i) = self.exact.get(&(n.clone(), String::new())) {
            return Some((self.entries[i].identifier.as_str(), LookupKind::NameOnly));
        }

        // 3) Partial organization.
        if !o.is_empty() {
            for e in &self.entries {
                if e.name == n
                    && !e.organization.is_empty()
                    && (o.contains(&e.organization) || e.organization.contains(&o))
                {
                    return Some((e.identifier.as_str(), LookupKind::PartialOrganization));
                }
            }
        }

        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercase, turn punctuation/dashes into spaces, collapse spaces.
fn normalize(s: &str) -> String {
    let mut out = s.trim().to_lowercase();

    for ch in ['—', '–', '-', '_', '/', '\\'] {
        out = out.replace(ch, " ");
    }
    out = out.replace(['\n', '\r', '\t', '.', ',', '’', '\''], " ");

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
