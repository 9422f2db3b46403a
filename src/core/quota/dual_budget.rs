//! Request-count plus token budget over a sliding window.

use std::time::Duration;

use tokio::time::Instant;

use super::{outside_window, QuotaPolicy, QuotaSnapshot, DEFAULT_WINDOW};
use crate::core::reclaim::ReclaimQueue;
use crate::util::ResourceDemand;

/// Output-size allowance: admission requires room for this multiple of the
/// input estimate.
pub const TOKEN_SAFETY_FACTOR: u64 = 2;

/// Requests-per-window and tokens-per-window budgets, as exposed by chat
/// completion providers.
///
/// Admission requires remaining tokens strictly greater than twice the
/// task's input estimate, approximating input plus output. This is a
/// heuristic overestimate, not exact accounting: the charge itself deducts
/// only the input estimate, and reclamation refunds exactly what was charged.
#[derive(Debug, Clone)]
pub struct DualBudgetPolicy {
    requests: u32,
    tokens: u64,
    window: Duration,
}

impl DualBudgetPolicy {
    /// Policy with the default 60s window.
    #[must_use]
    pub const fn new(requests_per_window: u32, tokens_per_window: u64) -> Self {
        Self {
            requests: requests_per_window,
            tokens: tokens_per_window,
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

impl QuotaPolicy for DualBudgetPolicy {
    fn name(&self) -> &'static str {
        "dual_budget"
    }

    fn admit(&self, demand: &ResourceDemand) -> bool {
        self.requests > 0 && self.tokens > demand.tokens.saturating_mul(TOKEN_SAFETY_FACTOR)
    }

    fn charge(&mut self, demand: &ResourceDemand) {
        self.requests = self.requests.saturating_sub(1);
        self.tokens = self.tokens.saturating_sub(demand.tokens);
    }

    fn reclaim(&mut self, completions: &mut ReclaimQueue, now: Instant) -> usize {
        let drained = completions.drain_while(outside_window(self.window, now));
        for completion in &drained {
            self.requests = self.requests.saturating_add(1);
            self.tokens = self.tokens.saturating_add(completion.demand.tokens);
        }
        drained.len()
    }

    fn snapshot(&self) -> QuotaSnapshot {
        QuotaSnapshot {
            requests: self.requests,
            tokens: Some(self.tokens),
        }
    }
}
