//! Configuration models for the engine and its quota policy.

pub mod engine;

pub use engine::{EngineConfig, QuotaConfig};
