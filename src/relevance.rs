// src/relevance.rs
//! News relevance scoring: config types, date parsing, per-item score breakdown and
//! ranking.
//!
//! Score over lower-cased `title + " " + description`:
//! person (+30), organization (+20), recency `max(0, 20 - days)`, credible source (+10,
//! once), +2 per distinct business keyword, -5 per distinct negative keyword, floored
//! at 0. Every missing or malformed field contributes nothing; scoring never fails.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};
use tracing::debug;

use crate::news::{NewsItem, ScoredNewsItem};
use crate::text::normalize_name;

pub const ENV_RELEVANCE_CONFIG_PATH: &str = "RELEVANCE_CONFIG_PATH";
pub const ENV_RELEVANCE_THRESHOLD: &str = "RELEVANCE_THRESHOLD";

const EMBEDDED_TOML: &str = include_str!("../config/relevance.toml");

// parse optional integer env, negative values clamp to 0
fn parse_threshold_env(raw: Option<String>) -> Option<u32> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|v| v.clamp(0, u32::MAX as i64) as u32)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankLimits {
    pub threshold: u32,
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Weights {
    pub person: u32,
    pub organization: u32,
    pub recency_max: u32,
    pub credible_source: u32,
    pub business_keyword: u32,
    pub negative_keyword: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordLists {
    #[serde(default)]
    pub credible_sources: Vec<String>,
    #[serde(default)]
    pub business_keywords: Vec<String>,
    #[serde(default)]
    pub negative_keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelevanceConfig {
    pub relevance: RankLimits,
    pub weights: Weights,
    pub lists: KeywordLists,
}

/// Per-term contributions of one score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub person: u32,
    pub organization: u32,
    pub recency: u32,
    pub credible_source: u32,
    pub business: u32,
    pub negative: u32,
    pub matched: Vec<String>,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        let plus = self.person as i64
            + self.organization as i64
            + self.recency as i64
            + self.credible_source as i64
            + self.business as i64;
        (plus - self.negative as i64).max(0) as u32
    }
}

#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    cfg: RelevanceConfig,
}

impl RelevanceScorer {
    pub fn new(mut cfg: RelevanceConfig) -> Self {
        cfg.lists.credible_sources = clean_list(cfg.lists.credible_sources);
        cfg.lists.business_keywords = clean_list(cfg.lists.business_keywords);
        cfg.lists.negative_keywords = clean_list(cfg.lists.negative_keywords);
        Self { cfg }
    }

    /// Load using `$RELEVANCE_CONFIG_PATH` (embedded default when unset), then apply
    /// `$RELEVANCE_THRESHOLD` when it parses.
    pub fn from_toml() -> anyhow::Result<Self> {
        let mut scorer = match std::env::var(ENV_RELEVANCE_CONFIG_PATH) {
            Ok(p) => {
                let path = PathBuf::from(p);
                let content = fs::read_to_string(&path).with_context(|| {
                    format!("Failed to read relevance config at {}", path.display())
                })?;
                Self::from_toml_str(&content)?
            }
            Err(_) => Self::from_toml_str(EMBEDDED_TOML)?,
        };
        if let Some(t) = parse_threshold_env(std::env::var(ENV_RELEVANCE_THRESHOLD).ok()) {
            scorer.cfg.relevance.threshold = t;
        }
        Ok(scorer)
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: RelevanceConfig =
            toml::from_str(toml_str).context("parsing relevance config toml")?;
        Ok(Self::new(cfg))
    }

    pub fn config(&self) -> &RelevanceConfig {
        &self.cfg
    }

    pub fn threshold(&self) -> u32 {
        self.cfg.relevance.threshold
    }

    pub fn score(&self, item: &NewsItem, person: &str, organization: &str) -> u32 {
        self.score_at(item, person, organization, Utc::now())
    }

    pub fn score_at(
        &self,
        item: &NewsItem,
        person: &str,
        organization: &str,
        now: DateTime<Utc>,
    ) -> u32 {
        self.breakdown_at(item, person, organization, now).total()
    }

    pub fn breakdown_at(
        &self,
        item: &NewsItem,
        person: &str,
        organization: &str,
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        let w = &self.cfg.weights;
        let text = format!("{} {}", item.title, item.description).to_lowercase();
        let mut b = ScoreBreakdown::default();

        let person = normalize_name(person);
        if !person.is_empty() && text.contains(&person) {
            b.person = w.person;
            b.matched.push(format!("person:{person}"));
        }
        let organization = normalize_name(organization);
        if !organization.is_empty() && text.contains(&organization) {
            b.organization = w.organization;
            b.matched.push(format!("organization:{organization}"));
        }

        if let Some(published) = item.published_at.as_deref().and_then(parse_published) {
            let days = (now.date_naive() - published).num_days().max(0);
            b.recency = (w.recency_max as i64 - days).max(0) as u32;
        }

        let source = item.source_name.to_lowercase();
        if let Some(hit) = self
            .cfg
            .lists
            .credible_sources
            .iter()
            .find(|s| source.contains(s.as_str()))
        {
            b.credible_source = w.credible_source;
            b.matched.push(format!("source:{hit}"));
        }

        for kw in &self.cfg.lists.business_keywords {
            if text.contains(kw.as_str()) {
                b.business += w.business_keyword;
                b.matched.push(format!("+{kw}"));
            }
        }
        for kw in &self.cfg.lists.negative_keywords {
            if text.contains(kw.as_str()) {
                b.negative += w.negative_keyword;
                b.matched.push(format!("-{kw}"));
            }
        }
        b
    }

    pub fn rank(&self, items: Vec<NewsItem>, person: &str, organization: &str) -> Vec<ScoredNewsItem> {
        self.rank_at(items, person, organization, Utc::now())
    }

    /// Drop incomplete items and same-title duplicates (first kept), keep scores at or
    /// above the threshold, sort descending (ties keep discovery order), truncate.
    pub fn rank_at(
        &self,
        items: Vec<NewsItem>,
        person: &str,
        organization: &str,
        now: DateTime<Utc>,
    ) -> Vec<ScoredNewsItem> {
        let total = items.len();
        let mut titles = HashSet::new();
        let mut scored: Vec<ScoredNewsItem> = items
            .into_iter()
            .filter(|i| !i.title.trim().is_empty() && !i.url.trim().is_empty())
            .filter(|i| titles.insert(normalize_name(&i.title)))
            .map(|item| {
                let relevance_score = self.score_at(&item, person, organization, now);
                ScoredNewsItem {
                    item,
                    relevance_score,
                }
            })
            .filter(|s| s.relevance_score >= self.cfg.relevance.threshold)
            .collect();

        scored.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
        scored.truncate(self.cfg.relevance.max_results);

        debug!(target: "relevance", total, kept = scored.len(), threshold = self.cfg.relevance.threshold, "ranked news");
        scored
    }
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self::from_toml_str(EMBEDDED_TOML).expect("embedded relevance config")
    }
}

/// Publication date from RFC 3339, a `YYYY-MM-DD` prefix, or RFC 2822.
pub fn parse_published(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Some(d) = s
        .get(..10)
        .and_then(|p| NaiveDate::parse_from_str(p, "%Y-%m-%d").ok())
    {
        return Some(d);
    }
    OffsetDateTime::parse(s, &Rfc2822).ok().and_then(|dt| {
        let dt = dt.to_offset(UtcOffset::UTC);
        NaiveDate::from_ymd_opt(dt.year(), u8::from(dt.month()) as u32, dt.day() as u32)
    })
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}
