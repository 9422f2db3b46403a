//! In-flight slot budget.

use tokio::time::Instant;

use super::{QuotaPolicy, QuotaSnapshot};
use crate::core::reclaim::ReclaimQueue;
use crate::util::ResourceDemand;

/// At most `max_in_flight` tasks run at once; a slot frees as soon as its
/// completion is swept, regardless of age.
#[derive(Debug, Clone)]
pub struct FixedConcurrencyPolicy {
    slots: u32,
}

impl FixedConcurrencyPolicy {
    /// Policy with `max_in_flight` slots.
    #[must_use]
    pub const fn new(max_in_flight: u32) -> Self {
        Self {
            slots: max_in_flight,
        }
    }
}

impl QuotaPolicy for FixedConcurrencyPolicy {
    fn name(&self) -> &'static str {
        "fixed_concurrency"
    }

    fn admit(&self, _demand: &ResourceDemand) -> bool {
        self.slots > 0
    }

    fn charge(&mut self, _demand: &ResourceDemand) {
        self.slots = self.slots.saturating_sub(1);
    }

    fn reclaim(&mut self, completions: &mut ReclaimQueue, _now: Instant) -> usize {
        let drained = completions.drain_while(|_| true);
        let count = u32::try_from(drained.len()).unwrap_or(u32::MAX);
        self.slots = self.slots.saturating_add(count);
        drained.len()
    }

    fn snapshot(&self) -> QuotaSnapshot {
        QuotaSnapshot {
            requests: self.slots,
            tokens: None,
        }
    }
}
