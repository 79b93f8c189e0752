// src/politeness.rs
//! Per-backend politeness budget for one resolution call.
//!
//! Every call waits until `min_delay + backoff` has passed since the previous call to the
//! same backend (the first call waits the full amount). Each rate-limit signal doubles
//! the backoff, starting at `base` and capped at `cap`.

use std::time::Duration;
use tokio::time::Instant;

use crate::config::BackoffConfig;

#[derive(Debug, Clone)]
pub struct Politeness {
    min_delay: Duration,
    base: Duration,
    cap: Duration,
    backoff: Duration,
    last_call: Option<Instant>,
    rate_limits: u32,
}

impl Politeness {
    pub fn new(min_delay: Duration, backoff: BackoffConfig) -> Self {
        Self {
            min_delay,
            base: Duration::from_millis(backoff.base_ms),
            cap: Duration::from_millis(backoff.cap_ms),
            backoff: Duration::ZERO,
            last_call: None,
            rate_limits: 0,
        }
    }

    pub fn from_millis(min_delay_ms: u64, backoff: BackoffConfig) -> Self {
        Self::new(Duration::from_millis(min_delay_ms), backoff)
    }

    /// Delay still owed before the next call at `now`.
    pub fn required_wait(&self, now: Instant) -> Duration {
        let budget = self.min_delay + self.backoff;
        match self.last_call {
            None => budget,
            Some(last) => budget.saturating_sub(now.saturating_duration_since(last)),
        }
    }

    /// Sleep off the owed delay, then mark the call as started.
    pub async fn wait_turn(&mut self) {
        let wait = self.required_wait(Instant::now());
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        self.last_call = Some(Instant::now());
    }

    /// Record a rate-limit signal; returns the new backoff.
    pub fn note_rate_limit(&mut self) -> Duration {
        self.rate_limits += 1;
        self.backoff = if self.backoff.is_zero() {
            self.base
        } else {
            (self.backoff * 2).min(self.cap)
        };
        self.backoff.min(self.cap)
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    pub fn rate_limits(&self) -> u32 {
        self.rate_limits
    }
}
