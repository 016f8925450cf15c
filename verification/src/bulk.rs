//! Sequential bulk verification.
//!
//! Entries are processed one at a time with a fixed pause between
//! provider-bound entries. A failing entry never stops the run; its outcome
//! is counted and the run moves on.

use bgv_protocol::Transport;
use bgv_store::VerificationStore;
use bgv_types::{CandidateId, EntryId};
use serde::Serialize;

use crate::engine::VerificationEngine;
use crate::report::EntryReport;
use crate::EngineError;

/// Aggregate result of a bulk run.
///
/// An entry left waiting on a scheduled retry counts as failed: it did not
/// verify in this run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Entries already being verified by another caller.
    pub skipped: usize,
    pub reports: Vec<EntryReport>,
}

impl BulkSummary {
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }
}

impl<T: Transport + 'static, S: VerificationStore + 'static> VerificationEngine<T, S> {
    /// Verify every listed entry that is not already verified.
    pub async fn verify_all(&self, ids: &[EntryId]) -> BulkSummary {
        let pending: Vec<&EntryId> = ids
            .iter()
            .filter(|id| match self.entry(id) {
                Some(entry) => !entry.status.is_fully_verified(),
                None => {
                    tracing::warn!(entry = %id, "bulk run skipping untracked entry");
                    false
                }
            })
            .collect();
        tracing::info!(requested = ids.len(), pending = pending.len(), "bulk verification started");

        let pacing = self.params().pacing();
        let mut summary = BulkSummary::default();
        let mut provider_bound = false;
        for id in pending {
            if provider_bound && !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }
            match self.verify_one(id).await {
                Ok(report) => {
                    provider_bound = true;
                    if report.is_verified() {
                        summary.succeeded += 1;
                    } else {
                        summary.failed += 1;
                    }
                    summary.reports.push(report);
                }
                Err(EngineError::AlreadyInFlight(_)) => {
                    tracing::debug!(entry = %id, "already in flight, skipped");
                    summary.skipped += 1;
                }
                Err(err) => {
                    tracing::warn!(entry = %id, error = %err, "entry could not be verified");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "bulk verification finished"
        );
        summary
    }

    /// Verify every tracked entry of `candidate`.
    pub async fn verify_candidate(&self, candidate: &CandidateId) -> BulkSummary {
        let ids: Vec<EntryId> = self
            .entries_for(candidate)
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        self.verify_all(&ids).await
    }
}
