//! Completion-ordered reclamation queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tokio::time::Instant;

use crate::util::{ResourceDemand, TaskId};

/// A finished attempt whose charged budget has not been returned yet.
#[derive(Debug, Clone, Copy)]
pub struct Completion {
    /// When the engine observed the attempt finishing.
    pub finished_at: Instant,
    /// Monotonic tie-break assigned at push time.
    pub sequence: u64,
    /// Task the completion belongs to.
    pub task_id: TaskId,
    /// Demand charged when the attempt was admitted.
    pub demand: ResourceDemand,
}

impl Completion {
    /// Time elapsed between completion and `now` (zero if `now` is earlier).
    #[must_use]
    pub fn age(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.finished_at)
    }
}

impl PartialEq for Completion {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for Completion {}

impl PartialOrd for Completion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Completion {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earliest (finished_at, sequence) on top of the max-heap.
        other
            .finished_at
            .cmp(&self.finished_at)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Min-heap of completions keyed by `(finished_at, sequence)`.
///
/// Equal timestamps pop in push order.
#[derive(Debug, Default)]
pub struct ReclaimQueue {
    heap: BinaryHeap<Completion>,
    next_sequence: u64,
}

impl ReclaimQueue {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completion and return its sequence number.
    pub fn push(&mut self, task_id: TaskId, demand: ResourceDemand, finished_at: Instant) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(Completion {
            finished_at,
            sequence,
            task_id,
            demand,
        });
        sequence
    }

    /// Oldest completion, if any.
    #[must_use]
    pub fn peek(&self) -> Option<&Completion> {
        self.heap.peek()
    }

    /// Remove and return the oldest completion.
    pub fn pop(&mut self) -> Option<Completion> {
        self.heap.pop()
    }

    /// Pop completions from the head while `eligible` holds.
    pub fn drain_while<F>(&mut self, mut eligible: F) -> Vec<Completion>
    where
        F: FnMut(&Completion) -> bool,
    {
        let mut drained = Vec::new();
        while self.heap.peek().is_some_and(&mut eligible) {
            if let Some(completion) = self.heap.pop() {
                drained.push(completion);
            }
        }
        drained
    }

    /// Outstanding completions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is awaiting reclamation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
