// src/news/providers/newsapi.rs
//! NewsAPI `everything` endpoint (JSON).

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::fetch::Fetcher;
use crate::news::{NewsItem, NewsProvider, NEWS_SEARCH_DAYS};

pub const ENDPOINT: &str = "https://newsapi.org/v2/everything";
const PAGE_SIZE: usize = 10;
const PLACEHOLDER_KEY: &str = "your_news_api_key_here";

pub fn is_usable_key(key: &str) -> bool {
    let k = key.trim();
    !k.is_empty() && k != PLACEHOLDER_KEY
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    source: Option<ArticleSource>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

pub struct NewsApiProvider {
    api_key: String,
    fetcher: Arc<dyn Fetcher>,
}

impl NewsApiProvider {
    pub fn new(api_key: impl Into<String>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            api_key: api_key.into(),
            fetcher,
        }
    }

    fn request_url(&self, query: &str) -> String {
        let from = (Utc::now() - Duration::days(NEWS_SEARCH_DAYS))
            .format("%Y-%m-%d")
            .to_string();
        format!(
            "{}?q={}&from={}&sortBy=publishedAt&language=en&pageSize={}&apiKey={}",
            ENDPOINT,
            urlencoding::encode(query),
            from,
            PAGE_SIZE,
            urlencoding::encode(&self.api_key)
        )
    }

    pub fn parse_articles(body: &str) -> Result<Vec<NewsItem>> {
        let env: Envelope = serde_json::from_str(body).context("parsing newsapi json")?;
        if env.status != "ok" {
            bail!(
                "newsapi error: {}",
                env.message.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(env
            .articles
            .into_iter()
            .map(|a| NewsItem {
                title: a.title.unwrap_or_default(),
                description: a.description.unwrap_or_default(),
                source_name: a.source.and_then(|s| s.name).unwrap_or_default(),
                published_at: a.published_at,
                url: a.url.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    async fn search(&self, query: &str) -> Result<Vec<NewsItem>> {
        let resp = self
            .fetcher
            .fetch(&self.request_url(query))
            .await
            .context("newsapi request")?;
        match resp.status {
            200 => Self::parse_articles(&resp.body),
            429 => bail!("newsapi rate limit reached"),
            401 => bail!("newsapi authentication failed"),
            other => bail!("newsapi status {other}"),
        }
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}
