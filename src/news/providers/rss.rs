use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::sync::Arc;

use crate::fetch::Fetcher;
use crate::news::{NewsItem, NewsProvider};
use crate::text::normalize_text;

pub const DEFAULT_FEED_URL: &str =
    "https://news.google.com/rss/search?q={query}&hl=en-US&gl=US&ceid=US:en";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    source: Option<ItemSource>,
}
#[derive(Debug, Deserialize)]
struct ItemSource {
    #[serde(rename = "$text")]
    name: Option<String>,
}

/// RSS search feed with a `{query}` placeholder in the URL.
pub struct RssNewsProvider {
    feed_url: String,
    fetcher: Arc<dyn Fetcher>,
}

impl RssNewsProvider {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_feed_url(DEFAULT_FEED_URL, fetcher)
    }

    pub fn with_feed_url(feed_url: impl Into<String>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            feed_url: feed_url.into(),
            fetcher,
        }
    }

    pub fn parse_items_from_str(s: &str) -> Result<Vec<NewsItem>> {
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing news rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            let url = it.link.unwrap_or_default().trim().to_string();
            if title.is_empty() || url.is_empty() {
                continue;
            }
            out.push(NewsItem {
                title,
                description: normalize_text(it.description.as_deref().unwrap_or_default()),
                source_name: it
                    .source
                    .and_then(|s| s.name)
                    .map(|n| n.trim().to_string())
                    .unwrap_or_default(),
                published_at: it.pub_date,
                url,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl NewsProvider for RssNewsProvider {
    async fn search(&self, query: &str) -> Result<Vec<NewsItem>> {
        let url = self
            .feed_url
            .replace("{query}", &urlencoding::encode(query));
        let resp = self.fetcher.fetch(&url).await.context("rss request")?;
        if resp.status != 200 {
            bail!("rss feed status {}", resp.status);
        }
        Self::parse_items_from_str(&resp.body)
    }

    fn name(&self) -> &'static str {
        "rss"
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
