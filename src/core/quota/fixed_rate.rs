//! Request-count budget over a sliding window.

use std::time::Duration;

use tokio::time::Instant;

use super::{outside_window, QuotaPolicy, QuotaSnapshot, DEFAULT_WINDOW};
use crate::core::reclaim::ReclaimQueue;
use crate::util::ResourceDemand;

/// Allows `requests_per_window` dispatches per sliding window.
#[derive(Debug, Clone)]
pub struct FixedRatePolicy {
    requests: u32,
    window: Duration,
}

impl FixedRatePolicy {
    /// Policy with the default 60s window.
    #[must_use]
    pub const fn new(requests_per_window: u32) -> Self {
        Self {
            requests: requests_per_window,
            window: DEFAULT_WINDOW,
        }
    }

    /// Override the window length.
    #[must_use]
    pub const fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }
}

impl QuotaPolicy for FixedRatePolicy {
    fn name(&self) -> &'static str {
        "fixed_rate"
    }

    fn admit(&self, _demand: &ResourceDemand) -> bool {
        self.requests > 0
    }

    fn charge(&mut self, _demand: &ResourceDemand) {
        self.requests = self.requests.saturating_sub(1);
    }

    fn reclaim(&mut self, completions: &mut ReclaimQueue, now: Instant) -> usize {
        let drained = completions.drain_while(outside_window(self.window, now));
        let count = u32::try_from(drained.len()).unwrap_or(u32::MAX);
        self.requests = self.requests.saturating_add(count);
        drained.len()
    }

    fn snapshot(&self) -> QuotaSnapshot {
        QuotaSnapshot {
            requests: self.requests,
            tokens: None,
        }
    }
}
