// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod error;
pub mod query;
pub mod text;

// Tables
pub mod identity_table;
pub mod nicknames;

// Resolution pipeline
pub mod cancel;
pub mod construct;
pub mod extract;
pub mod fetch;
pub mod matcher;
pub mod politeness;
pub mod profile_url;
pub mod resolver;
pub mod search;

// News + briefing
pub mod briefing;
pub mod news;
pub mod relevance;

pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::cancel::CancellationToken;
pub use crate::error::{ResolveError, UpstreamError};
pub use crate::extract::{canonicalize, CandidateIdentifier, Extractor, Origin, Technique};
pub use crate::fetch::{FetchResponse, Fetcher, HttpFetcher, ScriptedFetcher, ScriptedReply};
pub use crate::matcher::{MatchRule, MatchVerdict, Matcher, ReasonCode};
pub use crate::news::{NewsItem, ScoredNewsItem};
pub use crate::profile_url::resolve_from_url;
pub use crate::query::IdentityQuery;
pub use crate::relevance::RelevanceScorer;
pub use crate::resolver::{Resolution, ResolutionStatus, Resolver};
