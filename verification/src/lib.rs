//! Employment verification engine.
//!
//! Each work-history entry moves through company resolution and employee
//! confirmation against the verification provider:
//! 1. **State machine** ([`state`]): legal status transitions, nothing else.
//! 2. **Retry scheduler** ([`retry`]): bounded, cancelable backoff timers.
//! 3. **Engine** ([`engine`]): drives entries, refreshes rejected tokens,
//!    records every attempt and reconciles registry lookups.
//! 4. **Bulk runs** ([`bulk`]): sequential, paced, failure-isolated.

pub mod bulk;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod metrics;
pub mod reconcile;
pub mod report;
pub mod retry;
pub mod state;

pub use bulk::BulkSummary;
pub use config::EngineConfig;
pub use engine::{EngineBuilder, VerificationEngine};
pub use error::EngineError;
pub use events::EngineEvent;
pub use metrics::EngineMetrics;
pub use report::{EntryReport, RegistryReport};
pub use retry::{RetryScheduler, RetryState};
pub use state::{next_status, Transition, TransitionError};
