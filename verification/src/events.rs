//! Engine events for observers (UI, CLI progress output).

use bgv_types::{EntryId, FailureReason, RetryNotice, VerificationStatus};
use serde::Serialize;

/// Broadcast by the engine whenever an entry's visible state changes.
///
/// Receivers that lag behind lose the oldest events; the engine never blocks
/// on a slow observer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    StatusChanged {
        entry: EntryId,
        from: VerificationStatus,
        to: VerificationStatus,
    },
    RetryScheduled {
        entry: EntryId,
        notice: RetryNotice,
    },
    /// Verification reached a terminal status.
    Settled {
        entry: EntryId,
        status: VerificationStatus,
        failure: Option<FailureReason>,
    },
    /// An outcome could not be written to the store. In-memory state still
    /// reflects the provider's answer.
    PersistenceWarning { entry: EntryId, message: String },
}

impl EngineEvent {
    pub fn entry(&self) -> &EntryId {
        match self {
            Self::StatusChanged { entry, .. }
            | Self::RetryScheduled { entry, .. }
            | Self::Settled { entry, .. }
            | Self::PersistenceWarning { entry, .. } => entry,
        }
    }
}
