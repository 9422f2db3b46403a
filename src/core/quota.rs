//! Admission control policies.
//!
//! A policy answers one question per tick: may the task at the head of the
//! pending queue start now? Budget goes down only in [`QuotaPolicy::charge`],
//! right after a successful [`QuotaPolicy::admit`], and comes back only in
//! [`QuotaPolicy::reclaim`], one specific completion at a time, oldest first.
//!
//! | Policy | Budget | Admission | Reclaim |
//! |---|---|---|---|
//! | [`FixedRatePolicy`] | requests | requests > 0 | completion older than the window |
//! | [`DualBudgetPolicy`] | requests + tokens | requests > 0 and tokens > 2 × estimate | completion older than the window |
//! | [`FixedConcurrencyPolicy`] | in-flight slots | slots > 0 | every completion, immediately |

mod dual_budget;
mod fixed_concurrency;
mod fixed_rate;

use std::time::Duration;

use tokio::time::Instant;

use crate::core::reclaim::{Completion, ReclaimQueue};
use crate::util::ResourceDemand;

pub use dual_budget::DualBudgetPolicy;
pub use fixed_concurrency::FixedConcurrencyPolicy;
pub use fixed_rate::FixedRatePolicy;

/// Sliding window used by the rate-based policies unless configured otherwise.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Remaining budget, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    /// Remaining requests (or slots, for concurrency policies).
    pub requests: u32,
    /// Remaining tokens, when the policy tracks them.
    pub tokens: Option<u64>,
}

/// Admission control over a resource budget.
///
/// All methods are synchronous and never block.
pub trait QuotaPolicy: Send {
    /// Short policy name for logs.
    fn name(&self) -> &'static str;

    /// Whether a task with `demand` may start now. Must not mutate state.
    fn admit(&self, demand: &ResourceDemand) -> bool;

    /// Deduct `demand`. Only called right after `admit` returned true.
    fn charge(&mut self, demand: &ResourceDemand);

    /// Return budget for every eligible completion at the head of
    /// `completions`, removing them. Returns how many were reclaimed.
    fn reclaim(&mut self, completions: &mut ReclaimQueue, now: Instant) -> usize;

    /// Current remaining budget.
    fn snapshot(&self) -> QuotaSnapshot;
}

/// Eligibility test for sliding-window reclamation: strictly older than `window`.
pub(crate) fn outside_window(window: Duration, now: Instant) -> impl FnMut(&Completion) -> bool {
    move |completion| completion.age(now) > window
}
