// src/fetch.rs
//! Fetch collaborator: page fetches for search backends and existence probes.
//!
//! - `HttpFetcher`: reqwest clients (pooled, rustls), rotating user-agent, a separate
//!   non-following client for probes so redirects surface as statuses.
//! - `ScriptedFetcher`: deterministic in-memory replies keyed by URL substring, with a
//!   call log. Used by tests and offline runs.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::UpstreamError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, UpstreamError>;

    /// Status of `url` without following redirects; the body is not read.
    async fn probe(&self, url: &str) -> Result<u16, UpstreamError>;
}

const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

pub struct HttpFetcher {
    client: reqwest::Client,
    probe_client: reqwest::Client,
    next_agent: AtomicUsize,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers.clone())
            .build()?;
        let probe_client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            probe_client,
            next_agent: AtomicUsize::new(0),
        })
    }

    fn user_agent(&self) -> &'static str {
        let i = self.next_agent.fetch_add(1, Ordering::Relaxed);
        USER_AGENTS[i % USER_AGENTS.len()]
    }
}

fn map_reqwest(e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Timeout
    } else {
        UpstreamError::Transport(e.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, UpstreamError> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, self.user_agent())
            .send()
            .await
            .map_err(map_reqwest)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(map_reqwest)?;
        Ok(FetchResponse { status, body })
    }

    /// HEAD request without following redirects; only the status matters.
    async fn probe(&self, url: &str) -> Result<u16, UpstreamError> {
        let resp = self
            .probe_client
            .head(url)
            .header(reqwest::header::USER_AGENT, self.user_agent())
            .send()
            .await
            .map_err(map_reqwest)?;
        Ok(resp.status().as_u16())
    }
}

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Page { status: u16, body: String },
    Fail(UpstreamError),
    /// Never answers; exercises the caller's timeout.
    Hang,
}

impl ScriptedReply {
    pub fn page(body: impl Into<String>) -> Self {
        Self::Page {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self::Page {
            status,
            body: String::new(),
        }
    }
}

#[derive(Debug)]
struct Route {
    pattern: String,
    replies: Vec<ScriptedReply>,
    served: usize,
}

/// Replies are matched by URL substring (first registered route wins). A route's
/// replies are served in order; the last one repeats. Unmatched URLs get 404.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, pattern: impl Into<String>, reply: ScriptedReply) -> Self {
        self.route_seq(pattern, vec![reply])
    }

    pub fn route_seq(self, pattern: impl Into<String>, replies: Vec<ScriptedReply>) -> Self {
        lock(&self.routes).push(Route {
            pattern: pattern.into(),
            replies,
            served: 0,
        });
        self
    }

    /// Every URL requested so far (fetches and probes), in order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    async fn reply_for(&self, url: &str) -> Result<(u16, String), UpstreamError> {
        lock(&self.calls).push(url.to_string());
        let reply = {
            let mut routes = lock(&self.routes);
            routes
                .iter_mut()
                .find(|r| url.contains(&r.pattern) && !r.replies.is_empty())
                .map(|r| {
                    let i = r.served.min(r.replies.len() - 1);
                    r.served += 1;
                    r.replies[i].clone()
                })
        };
        match reply {
            Some(ScriptedReply::Page { status, body }) => Ok((status, body)),
            Some(ScriptedReply::Fail(e)) => Err(e),
            Some(ScriptedReply::Hang) => {
                std::future::pending::<()>().await;
                Err(UpstreamError::Timeout)
            }
            None => Ok((404, String::new())),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, UpstreamError> {
        let (status, body) = self.reply_for(url).await?;
        Ok(FetchResponse { status, body })
    }

    async fn probe(&self, url: &str) -> Result<u16, UpstreamError> {
        self.reply_for(url).await.map(|(status, _)| status)
    }
}
