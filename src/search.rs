// src/search.rs
//! Search backend description: renders query phrasings into request URLs.

use crate::config::BackendConfig;
use crate::query::IdentityQuery;

#[derive(Debug, Clone)]
pub struct SearchBackend {
    cfg: BackendConfig,
}

impl SearchBackend {
    pub fn new(cfg: BackendConfig) -> Self {
        Self { cfg }
    }

    pub fn name(&self) -> &str {
        &self.cfg.name
    }

    pub fn min_delay_ms(&self) -> u64 {
        self.cfg.min_delay_ms
    }

    /// Phrasings for `query` in configured order. Phrasings that need `{org}` are
    /// skipped when no organization was given; duplicates are dropped.
    pub fn phrasings(&self, query: &IdentityQuery) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.cfg.phrasings.len());
        for p in &self.cfg.phrasings {
            let rendered = match (p.contains("{org}"), query.organization()) {
                (true, None) => continue,
                (true, Some(org)) => p.replace("{org}", org),
                (false, _) => p.clone(),
            };
            let rendered = rendered.replace("{name}", query.full_name());
            if !out.contains(&rendered) {
                out.push(rendered);
            }
        }
        out
    }

    pub fn url_for(&self, phrase: &str) -> String {
        self.cfg
            .url_template
            .replace("{query}", &urlencoding::encode(phrase))
    }

    /// `(phrase, url)` pairs to try in order.
    pub fn variants(&self, query: &IdentityQuery) -> Vec<(String, String)> {
        self.phrasings(query)
            .into_iter()
            .map(|p| {
                let url = self.url_for(&p);
                (p, url)
            })
            .collect()
    }
}
