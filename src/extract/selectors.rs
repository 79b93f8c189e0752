// src/extract/selectors.rs
//! Configured structural selectors: `(tag, attribute, substring)` triples compiled to
//! attribute-value regexes. Loaded from a versioned TOML file so result-page markup
//! changes can be absorbed without a code change.

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::warn;

use super::{RawHit, Technique};

pub const ENV_SELECTORS_PATH: &str = "SELECTORS_CONFIG_PATH";

const SEED_TOML: &str = include_str!("../../config/selectors.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct SelectorSpec {
    pub id: String,
    pub tag: String,
    pub attr: String,
    /// Case-insensitive substring the attribute value must contain.
    #[serde(default)]
    pub contains: String,
}

#[derive(Debug, Deserialize)]
struct SelectorFile {
    version: String,
    #[serde(default)]
    selectors: Vec<SelectorSpec>,
}

#[derive(Debug, Clone)]
struct Compiled {
    spec: SelectorSpec,
    re: Regex,
    needle: String,
}

#[derive(Debug, Clone)]
pub struct SelectorSet {
    version: String,
    compiled: Vec<Compiled>,
}

impl SelectorSet {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: SelectorFile = toml::from_str(s).context("parsing selector toml")?;
        if file.version.trim().is_empty() {
            bail!("selector set has no version");
        }
        let mut compiled = Vec::with_capacity(file.selectors.len());
        for spec in file.selectors {
            if spec.tag.trim().is_empty() || spec.attr.trim().is_empty() {
                bail!("selector '{}' needs both tag and attr", spec.id);
            }
            // The attribute name must start after whitespace or a closing quote, so
            // `href` does not match inside `data-href`.
            let pattern = format!(
                r#"(?is)<{}\b[^>]*?[\s"']{}\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
                regex::escape(spec.tag.trim()),
                regex::escape(spec.attr.trim())
            );
            let re = Regex::new(&pattern)
                .with_context(|| format!("compiling selector '{}'", spec.id))?;
            let needle = spec.contains.trim().to_ascii_lowercase();
            compiled.push(Compiled { spec, re, needle });
        }
        Ok(Self {
            version: file.version,
            compiled,
        })
    }

    /// Load from a TOML file. Falls back to `default_seed()` on error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|s| Self::from_toml_str(&s))
        {
            Ok(s) => s,
            Err(e) => {
                warn!(target: "extract", error = ?e, path = %path.display(), "using seed selector set");
                Self::default_seed()
            }
        }
    }

    /// `$SELECTORS_CONFIG_PATH` when set, otherwise the embedded set.
    pub fn from_env() -> Self {
        match std::env::var(ENV_SELECTORS_PATH) {
            Ok(p) => Self::load_from_file(p),
            Err(_) => Self::default_seed(),
        }
    }

    pub fn default_seed() -> Self {
        Self::from_toml_str(SEED_TOML).expect("embedded selector set")
    }

    /// An empty set (disables the technique).
    pub fn empty() -> Self {
        Self {
            version: "none".into(),
            compiled: Vec::new(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.compiled.iter().map(|c| c.spec.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    pub(crate) fn scan(&self, html: &str) -> Vec<RawHit> {
        let mut out = Vec::new();
        for c in &self.compiled {
            for cap in c.re.captures_iter(html) {
                let Some(v) = cap.get(1).or_else(|| cap.get(2)) else {
                    continue;
                };
                let value = html_escape::decode_html_entities(v.as_str()).into_owned();
                if !c.needle.is_empty() && !value.to_ascii_lowercase().contains(&c.needle) {
                    continue;
                }
                out.push(RawHit::bare(value, Technique::Selector));
            }
        }
        out
    }
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self::default_seed()
    }
}
