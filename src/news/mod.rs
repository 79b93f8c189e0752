// src/news/mod.rs
//! News collection: item types, the provider seam, query building and the
//! fetch-all-then-rank helpers for a person and for their organization.

pub mod providers;

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::fetch::Fetcher;
use crate::metrics::{ensure_metrics_described, NEWS_PROVIDER_ERRORS, NEWS_RANKED};
use crate::relevance::RelevanceScorer;

pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";

/// Days of history requested from providers that support a date filter.
pub const NEWS_SEARCH_DAYS: i64 = 30;

/// Company headlines kept alongside the person's news.
pub const COMPANY_NEWS_LIMIT: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredNewsItem {
    #[serde(flatten)]
    pub item: NewsItem,
    pub relevance_score: u32,
}

/// A news source. Implementors run a ready-made query; the person query is built here.
#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<NewsItem>>;

    fn name(&self) -> &'static str;

    /// Items about a person and/or their organization. Blank input makes no request.
    async fn fetch_news(&self, person: &str, organization: &str) -> anyhow::Result<Vec<NewsItem>> {
        match build_search_query(person, organization) {
            Some(query) => self.search(&query).await,
            None => Ok(Vec::new()),
        }
    }
}

/// `"person" OR "organization" AND (business OR ...)`; `None` when both are blank.
pub fn build_search_query(person: &str, organization: &str) -> Option<String> {
    let parts: Vec<String> = [person, organization]
        .iter()
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
        .map(|s| format!("\"{s}\""))
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(format!(
        "{} AND (business OR company OR executive OR announcement OR interview OR leadership)",
        parts.join(" OR ")
    ))
}

/// `"organization" AND (announcement OR earnings OR ...)`; `None` when blank.
pub fn build_company_query(organization: &str) -> Option<String> {
    let org = organization.split_whitespace().collect::<Vec<_>>().join(" ");
    if org.is_empty() {
        return None;
    }
    Some(format!(
        "\"{org}\" AND (announcement OR earnings OR product OR launch OR partnership)"
    ))
}

/// Fetch from every provider, count and log failures, rank the union.
pub async fn collect_news(
    providers: &[Box<dyn NewsProvider>],
    scorer: &RelevanceScorer,
    person: &str,
    organization: &str,
) -> Vec<ScoredNewsItem> {
    ensure_metrics_described();

    let mut raw = Vec::new();
    for p in providers {
        match p.fetch_news(person, organization).await {
            Ok(mut v) => raw.append(&mut v),
            Err(e) => {
                warn!(target: "news", error = ?e, provider = p.name(), "provider error");
                counter!(NEWS_PROVIDER_ERRORS).increment(1);
            }
        }
    }

    let ranked = scorer.rank(raw, person, organization);
    counter!(NEWS_RANKED).increment(ranked.len() as u64);
    ranked
}

/// Recent company headlines: every provider is asked with the company query, the union
/// is ranked with no person and cut to [`COMPANY_NEWS_LIMIT`].
pub async fn collect_company_news(
    providers: &[Box<dyn NewsProvider>],
    scorer: &RelevanceScorer,
    organization: &str,
) -> Vec<ScoredNewsItem> {
    ensure_metrics_described();

    let Some(query) = build_company_query(organization) else {
        return Vec::new();
    };
    let mut raw = Vec::new();
    for p in providers {
        match p.search(&query).await {
            Ok(mut v) => raw.append(&mut v),
            Err(e) => {
                warn!(target: "news", error = ?e, provider = p.name(), "company news provider error");
                counter!(NEWS_PROVIDER_ERRORS).increment(1);
            }
        }
    }

    let mut ranked = scorer.rank(raw, "", organization);
    ranked.truncate(COMPANY_NEWS_LIMIT);
    counter!(NEWS_RANKED).increment(ranked.len() as u64);
    ranked
}

/// NewsAPI when `NEWS_API_KEY` is set to a real key, plus the RSS search feed.
pub fn providers_from_env(fetcher: Arc<dyn Fetcher>) -> Vec<Box<dyn NewsProvider>> {
    let mut out: Vec<Box<dyn NewsProvider>> = Vec::new();
    match std::env::var(ENV_NEWS_API_KEY) {
        Ok(key) if providers::newsapi::is_usable_key(&key) => {
            out.push(Box::new(providers::newsapi::NewsApiProvider::new(
                key,
                Arc::clone(&fetcher),
            )));
        }
        _ => warn!(target: "news", "NEWS_API_KEY not configured; NewsAPI provider disabled"),
    }
    out.push(Box::new(providers::rss::RssNewsProvider::new(fetcher)));
    out
}
