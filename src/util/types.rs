//! Shared identifiers and resource accounting units.

use serde::{Deserialize, Serialize};

/// Stable task identity: the 1-based line number of the task in the input stream.
pub type TaskId = u64;

/// Resource demand a task presents to a quota policy.
///
/// Every task costs exactly one request; `tokens` is the estimated input cost
/// (zero for records with no token notion).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDemand {
    /// Estimated input tokens.
    pub tokens: u64,
}

impl ResourceDemand {
    /// Demand carrying no token estimate.
    #[must_use]
    pub const fn none() -> Self {
        Self { tokens: 0 }
    }

    /// Demand with the given token estimate.
    #[must_use]
    pub const fn tokens(tokens: u64) -> Self {
        Self { tokens }
    }
}
