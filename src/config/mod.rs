// src/config/mod.rs
//! Resolver configuration (`config/resolver.toml`).
//!
//! The file is embedded as the default; `RESOLVER_CONFIG_PATH` points at an override.
//! Values are sanitized after parsing so the orchestrator never sees a zero top-N or an
//! inverted backoff window.

use anyhow::Context;
use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};

pub const ENV_RESOLVER_CONFIG_PATH: &str = "RESOLVER_CONFIG_PATH";

const EMBEDDED_TOML: &str = include_str!("../../config/resolver.toml");

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProfileConfig {
    /// Host fragment every profile URL contains (subdomains allowed).
    pub host: String,
    /// Path marker preceding the identifier.
    #[serde(default = "default_marker")]
    pub marker: String,
    /// Prefix a constructed identifier is appended to for probing.
    pub base_url: String,
}

fn default_marker() -> String {
    crate::extract::PROFILE_MARKER.to_string()
}

impl ProfileConfig {
    pub fn profile_url(&self, identifier: &str) -> String {
        format!("{}{}/", self.base_url, identifier)
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        ResolverConfig::default().profile
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LimitsConfig {
    pub validate_top_n: usize,
    pub max_candidates: usize,
    pub call_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct BackoffConfig {
    pub base_ms: u64,
    pub cap_ms: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BackendConfig {
    pub name: String,
    /// Search URL with a `{query}` placeholder (percent-encoded on render).
    pub url_template: String,
    pub min_delay_ms: u64,
    /// Query phrasings with `{name}` and optional `{org}` placeholders.
    #[serde(default)]
    pub phrasings: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProbeConfig {
    pub name: String,
    pub min_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConstructorConfig {
    /// Shapes over `{first}`, `{last}`, `{first0}` (first initial).
    pub shapes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ResolverConfig {
    pub profile: ProfileConfig,
    #[serde(rename = "resolver")]
    pub limits: LimitsConfig,
    pub backoff: BackoffConfig,
    pub primary: BackendConfig,
    pub secondary: BackendConfig,
    pub probe: ProbeConfig,
    pub constructor: ConstructorConfig,
}

impl ResolverConfig {
    /// Load using `$RESOLVER_CONFIG_PATH`, or the embedded default when unset.
    pub fn from_toml() -> anyhow::Result<Self> {
        match std::env::var(ENV_RESOLVER_CONFIG_PATH) {
            Ok(p) => {
                let path = PathBuf::from(p);
                let content = fs::read_to_string(&path).with_context(|| {
                    format!("Failed to read resolver config at {}", path.display())
                })?;
                Self::from_toml_str(&content)
            }
            Err(_) => Self::from_toml_str(EMBEDDED_TOML),
        }
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let mut cfg: ResolverConfig =
            toml::from_str(toml_str).context("parsing resolver config toml")?;
        cfg.sanitize()?;
        Ok(cfg)
    }

    fn sanitize(&mut self) -> anyhow::Result<()> {
        self.profile.host = self.profile.host.trim().to_ascii_lowercase();
        if self.profile.host.is_empty() {
            anyhow::bail!("profile.host must not be empty");
        }
        if self.profile.marker.trim().is_empty() {
            self.profile.marker = default_marker();
        }
        if !self.profile.base_url.ends_with('/') {
            self.profile.base_url.push('/');
        }
        for backend in [&self.primary, &self.secondary] {
            if !backend.url_template.contains("{query}") {
                anyhow::bail!("backend '{}' url_template lacks {{query}}", backend.name);
            }
        }

        self.limits.validate_top_n = self.limits.validate_top_n.max(1);
        self.limits.max_candidates = self.limits.max_candidates.max(self.limits.validate_top_n);
        if self.limits.call_timeout_ms == 0 {
            self.limits.call_timeout_ms = 15_000;
        }
        if self.backoff.cap_ms < self.backoff.base_ms {
            std::mem::swap(&mut self.backoff.cap_ms, &mut self.backoff.base_ms);
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.limits.call_timeout_ms)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::from_toml_str(EMBEDDED_TOML).expect("embedded resolver config")
    }
}
