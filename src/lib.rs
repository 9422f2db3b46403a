//! # Prometheus Batch Runner
//!
//! A resumable, quota-governed batch executor for latency-bound remote calls
//! (LLM chat completions, embeddings) against rate-limited backends.
//!
//! Input is a JSONL file, one task per line. Each task is dispatched to an
//! injected [`TaskRunner`](core::TaskRunner) once a [`QuotaPolicy`](core::QuotaPolicy)
//! admits it; successful results are appended and flushed to a JSONL output
//! file one line at a time. Because the output doubles as resume state, an
//! interrupted run can simply be started again: tasks already in the output
//! are skipped.
//!
//! ## Key Features
//!
//! - **Sliding-window quotas**: requests-per-minute, or requests plus tokens
//!   per minute, with budget returned only once a completion leaves the window
//! - **Fixed concurrency**: a plain in-flight cap for self-hosted backends
//! - **Bounded retries**: failed attempts go back to the end of the queue
//!   until `max_task_runs` is reached
//! - **Crash-safe output**: every success is flushed before the next tick
//! - **Vector artifacts**: embedding batches stream raw `f64` values to a side file
//!
//! ## Example
//!
//! ```rust,ignore
//! use prometheus_batch_runner::builders::run_batch;
//! use prometheus_batch_runner::config::{EngineConfig, QuotaConfig};
//! use prometheus_batch_runner::core::BasicRecordFactory;
//!
//! let config = EngineConfig::new(
//!     "input.jsonl",
//!     "output.jsonl",
//!     QuotaConfig::FixedRate { requests_per_window: 5, window_secs: 60 },
//! )
//! .with_max_task_runs(2);
//!
//! let report = run_batch(config, BasicRecordFactory, my_runner).await?;
//! println!("{} succeeded, {} dropped", report.succeeded, report.dropped.len());
//! ```
//!
//! For complete examples, see `tests/engine_algorithm_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions and quota accounting.
pub mod core;
/// Configuration models for the engine and quota policies.
pub mod config;
/// Builders to construct engines from configuration.
pub mod builders;
/// Infrastructure adapters for input, output and artifact streams.
pub mod infra;
/// Shared utilities.
pub mod util;
