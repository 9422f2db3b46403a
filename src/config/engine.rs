//! Engine and quota configuration structures.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::TaskId;

const fn default_max_task_runs() -> u32 {
    1
}

const fn default_poll_interval_ms() -> u64 {
    1
}

const fn default_window_secs() -> u64 {
    60
}

/// Quota policy selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuotaConfig {
    /// Request count per sliding window.
    FixedRate {
        /// Requests allowed per window.
        requests_per_window: u32,
        /// Window length in seconds.
        #[serde(default = "default_window_secs")]
        window_secs: u64,
    },
    /// Request count plus token estimate per sliding window.
    DualBudget {
        /// Requests allowed per window.
        requests_per_window: u32,
        /// Tokens allowed per window.
        tokens_per_window: u64,
        /// Window length in seconds.
        #[serde(default = "default_window_secs")]
        window_secs: u64,
    },
    /// Fixed number of in-flight tasks.
    FixedConcurrency {
        /// Maximum simultaneously running tasks.
        max_in_flight: u32,
    },
}

impl QuotaConfig {
    /// Validate budget values.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first zero budget or window.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Self::FixedRate {
                requests_per_window,
                window_secs,
            } => {
                if requests_per_window == 0 {
                    return Err("requests_per_window must be greater than 0".into());
                }
                if window_secs == 0 {
                    return Err("window_secs must be greater than 0".into());
                }
            }
            Self::DualBudget {
                requests_per_window,
                tokens_per_window,
                window_secs,
            } => {
                if requests_per_window == 0 {
                    return Err("requests_per_window must be greater than 0".into());
                }
                if tokens_per_window == 0 {
                    return Err("tokens_per_window must be greater than 0".into());
                }
                if window_secs == 0 {
                    return Err("window_secs must be greater than 0".into());
                }
            }
            Self::FixedConcurrency { max_in_flight } => {
                if max_in_flight == 0 {
                    return Err("max_in_flight must be greater than 0".into());
                }
            }
        }
        Ok(())
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Newline-delimited JSON input.
    pub input_path: PathBuf,
    /// Newline-delimited JSON output, also the resume state.
    pub output_path: PathBuf,
    /// Maximum dispatches per task.
    #[serde(default = "default_max_task_runs")]
    pub max_task_runs: u32,
    /// First input line to process (inclusive).
    #[serde(default)]
    pub start_id: Option<TaskId>,
    /// Last input line to process (inclusive); reading stops past it.
    #[serde(default)]
    pub end_id: Option<TaskId>,
    /// Truncate output instead of resuming from it.
    #[serde(default)]
    pub rewrite_output: bool,
    /// Sleep between ticks, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Quota policy.
    pub quota: QuotaConfig,
}

impl EngineConfig {
    /// Configuration with defaults for everything but paths and quota.
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        quota: QuotaConfig,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            max_task_runs: default_max_task_runs(),
            start_id: None,
            end_id: None,
            rewrite_output: false,
            poll_interval_ms: default_poll_interval_ms(),
            quota,
        }
    }

    /// Set the retry cap.
    #[must_use]
    pub const fn with_max_task_runs(mut self, max_task_runs: u32) -> Self {
        self.max_task_runs = max_task_runs;
        self
    }

    /// Restrict processing to input lines `start_id..=end_id`.
    #[must_use]
    pub const fn with_range(mut self, start_id: Option<TaskId>, end_id: Option<TaskId>) -> Self {
        self.start_id = start_id;
        self.end_id = end_id;
        self
    }

    /// Truncate output instead of resuming.
    #[must_use]
    pub const fn with_rewrite_output(mut self, rewrite_output: bool) -> Self {
        self.rewrite_output = rewrite_output;
        self
    }

    /// Set the tick sleep.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Tick sleep as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_task_runs == 0 {
            return Err("max_task_runs must be greater than 0".into());
        }
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".into());
        }
        if let (Some(start), Some(end)) = (self.start_id, self.end_id) {
            if start > end {
                return Err(format!("start_id {start} is after end_id {end}"));
            }
        }
        if self.input_path == self.output_path {
            return Err("input_path and output_path must differ".into());
        }
        self.quota
            .validate()
            .map_err(|e| format!("quota invalid: {e}"))
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a message for parse or validation failures.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from `BATCH_*` environment variables, reading a
    /// `.env` file first when present.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `BATCH_INPUT_FILE` | `input_path` (required) |
    /// | `BATCH_OUTPUT_FILE` | `output_path` (required) |
    /// | `BATCH_QUOTA` | `quota`, as JSON (required) |
    /// | `BATCH_MAX_TASK_RUNS` | `max_task_runs` |
    /// | `BATCH_START_ID` / `BATCH_END_ID` | `start_id` / `end_id` |
    /// | `BATCH_REWRITE_OUTPUT` | `rewrite_output` |
    /// | `BATCH_POLL_INTERVAL_MS` | `poll_interval_ms` |
    ///
    /// # Errors
    ///
    /// Returns a message for missing, unparsable or invalid values.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] over an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns a message for missing, unparsable or invalid values.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, String>
    where
        L: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| lookup(key).ok_or_else(|| format!("{key} is not set"));

        let quota: QuotaConfig = serde_json::from_str(&require("BATCH_QUOTA")?)
            .map_err(|e| format!("BATCH_QUOTA: {e}"))?;
        let mut cfg = Self::new(
            require("BATCH_INPUT_FILE")?,
            require("BATCH_OUTPUT_FILE")?,
            quota,
        );

        if let Some(value) = lookup("BATCH_MAX_TASK_RUNS") {
            cfg.max_task_runs = parse_var("BATCH_MAX_TASK_RUNS", &value)?;
        }
        if let Some(value) = lookup("BATCH_START_ID") {
            cfg.start_id = Some(parse_var("BATCH_START_ID", &value)?);
        }
        if let Some(value) = lookup("BATCH_END_ID") {
            cfg.end_id = Some(parse_var("BATCH_END_ID", &value)?);
        }
        if let Some(value) = lookup("BATCH_REWRITE_OUTPUT") {
            cfg.rewrite_output = parse_flag("BATCH_REWRITE_OUTPUT", &value)?;
        }
        if let Some(value) = lookup("BATCH_POLL_INTERVAL_MS") {
            cfg.poll_interval_ms = parse_var("BATCH_POLL_INTERVAL_MS", &value)?;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e| format!("{key}: {e}"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("{key}: expected a boolean, got `{other}`")),
    }
}
