// src/resolver.rs
//! Resolution orchestrator.
//!
//! Strategies, strictly in order, first success wins:
//! 1. static identity table (trusted, no network);
//! 2. primary search backend, per phrasing, until candidates appear;
//!    top-N candidates are validated by the matcher;
//! 3. secondary search backend, only when step 2 produced nothing; same validation;
//! 4. constructed identifiers, each probed for existence;
//! 5. nothing left: `NoCandidateFound`.
//!
//! Upstream faults never escape: they make the current step produce nothing. Politeness
//! and backoff state is created per call, so concurrent resolutions share nothing
//! mutable.

use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::config::ResolverConfig;
use crate::construct::{probe_succeeded, UrlConstructor};
use crate::error::{ResolveError, UpstreamError};
use crate::extract::{CandidateIdentifier, Extractor, Origin, SelectorSet, Technique};
use crate::fetch::{FetchResponse, Fetcher};
use crate::identity_table::IdentityTable;
use crate::matcher::{MatchVerdict, Matcher};
use crate::metrics::{
    ensure_metrics_described, RESOLVE_DURATION_MS, RESOLVE_OUTCOME, RESOLVE_PROBE_ATTEMPTS,
    RESOLVE_RATE_LIMITED, RESOLVE_REQUESTS, RESOLVE_STRATEGY_HITS, RESOLVE_UPSTREAM_ERRORS,
};
use crate::nicknames::EquivalenceTable;
use crate::politeness::Politeness;
use crate::query::IdentityQuery;
use crate::search::SearchBackend;
use crate::text::anon_hash;

const RATE_LIMITED: u16 = 429;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "verdict", rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// From the static identity table.
    Trusted,
    /// Search candidate accepted by the matcher.
    Validated(MatchVerdict),
    /// Constructed identifier that answered an existence probe.
    Probed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub identifier: CandidateIdentifier,
    pub status: ResolutionStatus,
}

impl Resolution {
    pub fn canonical(&self) -> &str {
        &self.identifier.canonical
    }
}

/// Per-call state of one search backend.
struct BackendState {
    politeness: Politeness,
    abandoned: bool,
}

pub struct Resolver {
    config: ResolverConfig,
    identities: Arc<IdentityTable>,
    matcher: Matcher,
    extractor: Extractor,
    constructor: UrlConstructor,
    primary: SearchBackend,
    secondary: SearchBackend,
    fetcher: Arc<dyn Fetcher>,
}

impl Resolver {
    pub fn new(
        config: ResolverConfig,
        identities: Arc<IdentityTable>,
        nicknames: Arc<EquivalenceTable>,
        selectors: SelectorSet,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let extractor = Extractor::from_config(&config.profile, selectors);
        let constructor = UrlConstructor::new(&config.constructor.shapes, Arc::clone(&nicknames));
        let primary = SearchBackend::new(config.primary.clone());
        let secondary = SearchBackend::new(config.secondary.clone());
        Self {
            matcher: Matcher::new(nicknames),
            config,
            identities,
            extractor,
            constructor,
            primary,
            secondary,
            fetcher,
        }
    }

    /// Embedded configuration and seed tables.
    pub fn with_defaults(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::new(
            ResolverConfig::default(),
            Arc::new(IdentityTable::default_seed()),
            Arc::new(EquivalenceTable::default_seed()),
            SelectorSet::default_seed(),
            fetcher,
        )
    }

    /// Configuration and tables from their `*_PATH` environment overrides.
    pub fn from_env(fetcher: Arc<dyn Fetcher>) -> anyhow::Result<Self> {
        Ok(Self::new(
            ResolverConfig::from_toml()?,
            Arc::new(IdentityTable::from_env()),
            Arc::new(EquivalenceTable::from_env()),
            SelectorSet::from_env(),
            fetcher,
        ))
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Full profile URL for an identifier.
    pub fn profile_url(&self, identifier: &str) -> String {
        self.config.profile.profile_url(identifier)
    }

    /// Validate the inputs and resolve without external cancellation.
    pub async fn resolve_name(
        &self,
        full_name: &str,
        organization: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let query = match IdentityQuery::new(full_name, organization) {
            Ok(q) => q,
            Err(e) => {
                ensure_metrics_described();
                counter!(RESOLVE_OUTCOME, "outcome" => "invalid").increment(1);
                return Err(e);
            }
        };
        self.resolve(&query, &CancellationToken::new()).await
    }

    pub async fn resolve(
        &self,
        query: &IdentityQuery,
        cancel: &CancellationToken,
    ) -> Result<Resolution, ResolveError> {
        ensure_metrics_described();
        counter!(RESOLVE_REQUESTS).increment(1);
        let t0 = Instant::now();
        let qid = anon_hash(&query.normalized_name());

        let result = self.run(query, cancel, &qid).await;

        let outcome = match &result {
            Ok(r) => match r.status {
                ResolutionStatus::Trusted => "trusted",
                ResolutionStatus::Validated(_) => "validated",
                ResolutionStatus::Probed => "probed",
            },
            Err(ResolveError::AmbiguousCandidate { .. }) => "ambiguous",
            Err(ResolveError::NoCandidateFound) => "not_found",
            Err(ResolveError::Cancelled) => "cancelled",
            Err(_) => "invalid",
        };
        counter!(RESOLVE_OUTCOME, "outcome" => outcome).increment(1);
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!(RESOLVE_DURATION_MS).record(ms);
        info!(target: "resolver", query = %qid, outcome, ms, "resolution finished");

        result
    }

    async fn run(
        &self,
        query: &IdentityQuery,
        cancel: &CancellationToken,
        qid: &str,
    ) -> Result<Resolution, ResolveError> {
        // 1) Static table.
        check(cancel)?;
        if let Some((id, kind)) = self
            .identities
            .lookup(query.full_name(), query.organization().unwrap_or_default())
        {
            counter!(RESOLVE_STRATEGY_HITS, "strategy" => Origin::StaticTable.as_str()).increment(1);
            debug!(target: "resolver", query = %qid, ?kind, "static table hit");
            let identifier =
                CandidateIdentifier::new(id, id, Origin::StaticTable, Technique::Lookup).with_hint(
                    Some(query.full_name().to_string()),
                    query.organization().map(str::to_string),
                );
            return Ok(Resolution {
                identifier,
                status: ResolutionStatus::Trusted,
            });
        }

        // 2-3) Primary search, then validation.
        check(cancel)?;
        let mut primary = self.backend_state(&self.primary);
        let found = self
            .search(&self.primary, &mut primary, query, Origin::PrimarySearch, cancel, qid)
            .await?;
        if !found.is_empty() {
            return self.validate(found, query, qid);
        }

        // 4) Secondary search, only when the primary produced nothing.
        check(cancel)?;
        let mut secondary = self.backend_state(&self.secondary);
        let found = self
            .search(&self.secondary, &mut secondary, query, Origin::SecondarySearch, cancel, qid)
            .await?;
        if !found.is_empty() {
            return self.validate(found, query, qid);
        }

        // 5) Constructed identifiers + existence probes.
        check(cancel)?;
        if let Some(resolution) = self.probe_constructed(query, cancel, qid).await? {
            return Ok(resolution);
        }

        Err(ResolveError::NoCandidateFound)
    }

    fn backend_state(&self, backend: &SearchBackend) -> BackendState {
        BackendState {
            politeness: Politeness::from_millis(backend.min_delay_ms(), self.config.backoff),
            abandoned: false,
        }
    }

    /// Try each phrasing until one yields candidates. A rate-limit signal abandons the
    /// backend for the rest of this call; any other fault skips to the next phrasing.
    async fn search(
        &self,
        backend: &SearchBackend,
        state: &mut BackendState,
        query: &IdentityQuery,
        origin: Origin,
        cancel: &CancellationToken,
        qid: &str,
    ) -> Result<Vec<CandidateIdentifier>, ResolveError> {
        for (variant, (_phrase, url)) in backend.variants(query).into_iter().enumerate() {
            if state.abandoned {
                break;
            }
            check(cancel)?;
            state.politeness.wait_turn().await;

            match self.fetch_bounded(&url).await {
                Ok(FetchResponse { status: RATE_LIMITED, .. }) => {
                    let backoff = state.politeness.note_rate_limit();
                    state.abandoned = true;
                    counter!(RESOLVE_RATE_LIMITED, "backend" => backend.name().to_string())
                        .increment(1);
                    warn!(
                        target: "resolver",
                        query = %qid,
                        backend = backend.name(),
                        backoff_ms = backoff.as_millis() as u64,
                        "rate limited; abandoning backend"
                    );
                }
                Ok(FetchResponse { status: 200, body }) => {
                    let mut found = self.extractor.extract(&body, origin);
                    if found.is_empty() {
                        debug!(target: "resolver", query = %qid, backend = backend.name(), variant, "no candidates");
                        continue;
                    }
                    found.truncate(self.config.limits.max_candidates);
                    counter!(RESOLVE_STRATEGY_HITS, "strategy" => origin.as_str()).increment(1);
                    debug!(target: "resolver", query = %qid, backend = backend.name(), variant, found = found.len(), "candidates found");
                    return Ok(found);
                }
                Ok(FetchResponse { status, .. }) => {
                    self.note_upstream_error(backend.name(), &UpstreamError::Status(status), qid);
                }
                Err(e) => self.note_upstream_error(backend.name(), &e, qid),
            }
        }
        Ok(Vec::new())
    }

    /// First of the top-N candidates the matcher accepts; otherwise the first candidate
    /// comes back as an unvalidated best guess.
    fn validate(
        &self,
        candidates: Vec<CandidateIdentifier>,
        query: &IdentityQuery,
        qid: &str,
    ) -> Result<Resolution, ResolveError> {
        for candidate in candidates.iter().take(self.config.limits.validate_top_n) {
            let verdict = self.matcher.matches(candidate, query);
            debug!(
                target: "resolver",
                query = %qid,
                candidate = %candidate.canonical,
                accepted = verdict.accepted,
                reason = ?verdict.reason,
                "validated candidate"
            );
            if verdict.accepted {
                return Ok(Resolution {
                    identifier: candidate.clone(),
                    status: ResolutionStatus::Validated(verdict),
                });
            }
        }
        match candidates.into_iter().next() {
            Some(best_guess) => Err(ResolveError::AmbiguousCandidate { best_guess }),
            None => Err(ResolveError::NoCandidateFound),
        }
    }

    async fn probe_constructed(
        &self,
        query: &IdentityQuery,
        cancel: &CancellationToken,
        qid: &str,
    ) -> Result<Option<Resolution>, ResolveError> {
        let backend = self.config.probe.name.as_str();
        let mut politeness = Politeness::from_millis(self.config.probe.min_delay_ms, self.config.backoff);

        for candidate in self.constructor.construct(query) {
            check(cancel)?;
            politeness.wait_turn().await;
            counter!(RESOLVE_PROBE_ATTEMPTS).increment(1);

            let url = self.profile_url(&candidate.canonical);
            match self.probe_bounded(&url).await {
                Ok(status) if probe_succeeded(status) => {
                    counter!(RESOLVE_STRATEGY_HITS, "strategy" => Origin::Constructed.as_str())
                        .increment(1);
                    debug!(target: "resolver", query = %qid, candidate = %candidate.canonical, status, "probe succeeded");
                    return Ok(Some(Resolution {
                        identifier: candidate,
                        status: ResolutionStatus::Probed,
                    }));
                }
                Ok(RATE_LIMITED) => {
                    // Probes keep going, only slower.
                    let backoff = politeness.note_rate_limit();
                    counter!(RESOLVE_RATE_LIMITED, "backend" => backend.to_string()).increment(1);
                    warn!(target: "resolver", query = %qid, backend, backoff_ms = backoff.as_millis() as u64, "probe rate limited");
                }
                Ok(status) => {
                    debug!(target: "resolver", query = %qid, candidate = %candidate.canonical, status, "probe missed");
                }
                Err(e) => self.note_upstream_error(backend, &e, qid),
            }
        }
        Ok(None)
    }

    async fn fetch_bounded(&self, url: &str) -> Result<FetchResponse, UpstreamError> {
        tokio::time::timeout(self.config.call_timeout(), self.fetcher.fetch(url))
            .await
            .unwrap_or(Err(UpstreamError::Timeout))
    }

    async fn probe_bounded(&self, url: &str) -> Result<u16, UpstreamError> {
        tokio::time::timeout(self.config.call_timeout(), self.fetcher.probe(url))
            .await
            .unwrap_or(Err(UpstreamError::Timeout))
    }

    fn note_upstream_error(&self, backend: &str, err: &UpstreamError, qid: &str) {
        counter!(RESOLVE_UPSTREAM_ERRORS, "backend" => backend.to_string()).increment(1);
        debug!(target: "resolver", query = %qid, backend, error = %err, "upstream produced nothing");
    }
}

fn check(cancel: &CancellationToken) -> Result<(), ResolveError> {
    if cancel.is_cancelled() {
        Err(ResolveError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ScriptedFetcher;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn resolver_is_shareable() {
        assert_send_sync::<Resolver>();
    }

    #[tokio::test]
    async fn invalid_query_runs_nothing() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let r = Resolver::with_defaults(fetcher.clone());
        let err = r.resolve_name("  ", None).await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidQuery { .. }));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let r = Resolver::with_defaults(fetcher.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let q = IdentityQuery::new("Satya Nadella", Some("Microsoft")).unwrap();
        assert!(matches!(r.resolve(&q, &cancel).await, Err(ResolveError::Cancelled)));
    }
}
