// src/metrics.rs
//! Metric names and one-time descriptions. Without an installed recorder every
//! `metrics` macro is a no-op, so library users opt in by installing their own.

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

pub const RESOLVE_REQUESTS: &str = "resolve_requests_total";
pub const RESOLVE_OUTCOME: &str = "resolve_outcome_total";
pub const RESOLVE_STRATEGY_HITS: &str = "resolve_strategy_hits_total";
pub const RESOLVE_UPSTREAM_ERRORS: &str = "resolve_upstream_errors_total";
pub const RESOLVE_RATE_LIMITED: &str = "resolve_rate_limited_total";
pub const RESOLVE_PROBE_ATTEMPTS: &str = "resolve_probe_attempts_total";
pub const RESOLVE_DURATION_MS: &str = "resolve_duration_ms";
pub const NEWS_PROVIDER_ERRORS: &str = "news_provider_errors_total";
pub const NEWS_RANKED: &str = "news_ranked_total";

pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(RESOLVE_REQUESTS, "Resolution calls started.");
        describe_counter!(
            RESOLVE_OUTCOME,
            "Resolution results by outcome (trusted/validated/probed/ambiguous/not_found/cancelled/invalid)."
        );
        describe_counter!(
            RESOLVE_STRATEGY_HITS,
            "Strategies that produced at least one candidate."
        );
        describe_counter!(
            RESOLVE_UPSTREAM_ERRORS,
            "Transport errors, timeouts and unexpected statuses per backend."
        );
        describe_counter!(RESOLVE_RATE_LIMITED, "Rate-limit signals per backend.");
        describe_counter!(RESOLVE_PROBE_ATTEMPTS, "Existence probes issued.");
        describe_histogram!(RESOLVE_DURATION_MS, "Wall time of one resolution in milliseconds.");
        describe_counter!(NEWS_PROVIDER_ERRORS, "News provider fetch/parse errors.");
        describe_counter!(NEWS_RANKED, "News items that survived ranking.");
    });
}
