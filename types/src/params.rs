//! Engine parameters: retry budget, backoff and bulk pacing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables shared by the retry scheduler and the bulk orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    /// Maximum provider attempts per entry before settling into a failed state.
    pub max_attempts: u32,

    /// Fixed delay before a transient failure is retried, in seconds.
    pub retry_backoff_secs: u64,

    /// Delay between consecutive entries in a bulk run, in milliseconds.
    pub pacing_millis: u64,
}

impl EngineParams {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_millis)
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_backoff_secs: 300,
            pacing_millis: 1_000,
        }
    }
}
