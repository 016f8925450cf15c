//! Per-entry results handed back to callers.

use bgv_types::{
    CandidateId, EntryId, FailureReason, NationalRegistryRecord, RegistryResult, RetryNotice,
    VerificationStatus, WorkHistoryEntry,
};
use bgv_utils::format_duration;
use serde::Serialize;

/// Where one entry stands after a verification trigger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub entry: EntryId,
    pub status: VerificationStatus,
    /// Human-readable summary of `status`, failure and retry.
    pub message: String,
    pub failure: Option<FailureReason>,
    pub retry: Option<RetryNotice>,
    /// Store writes that failed while processing this entry.
    pub warnings: Vec<String>,
}

impl EntryReport {
    pub(crate) fn from_entry(entry: &WorkHistoryEntry, backoff_secs: u64, warnings: Vec<String>) -> Self {
        let message = match (&entry.retry, &entry.last_failure) {
            (Some(notice), _) => format!(
                "retrying (attempt {} of {}) in {}",
                notice.attempt + 1,
                notice.max_attempts,
                format_duration(backoff_secs)
            ),
            (None, Some(failure)) if entry.status.is_failed() => failure.to_string(),
            _ => entry.status.label().to_string(),
        };
        Self {
            entry: entry.id.clone(),
            status: entry.status,
            message,
            failure: entry.last_failure.clone().filter(|_| entry.status.is_failed()),
            retry: entry.retry.clone(),
            warnings,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.status.is_fully_verified()
    }

    pub fn is_retry_pending(&self) -> bool {
        self.retry.is_some()
    }
}

/// Result of a registry lookup for one candidate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegistryReport {
    pub candidate: CandidateId,
    pub result: RegistryResult,
    /// Served from the store without a provider call.
    pub cached: bool,
    /// Informational note, e.g. when the identifier has no record.
    pub notice: Option<String>,
    /// Tracked entries the lookup confirmed as verified.
    pub confirmed: Vec<EntryId>,
    pub warnings: Vec<String>,
}

impl RegistryReport {
    pub fn records(&self) -> &[NationalRegistryRecord] {
        self.result.records()
    }
}
