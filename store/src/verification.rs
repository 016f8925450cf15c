//! Verification persistence trait.

use crate::StoreError;
use std::sync::Arc;
use bgv_types::{CandidateId, CompanyMatchToken, EntryId, NationalRegistryRecord, VerificationOutcome};

/// Durable log of verification attempts plus the derived lookups the engine
/// needs on restart.
///
/// Writes are append-only: an attempt, once recorded, is never rewritten.
pub trait VerificationStore: Send + Sync {
    /// Record one attempt outcome for `entry`.
    ///
    /// A successful company outcome also becomes the entry's latest verified
    /// state.
    fn append_attempt(&self, entry: &EntryId, outcome: &VerificationOutcome)
        -> Result<(), StoreError>;

    /// All attempts for `entry`, oldest first.
    fn attempts(&self, entry: &EntryId) -> Result<Vec<VerificationOutcome>, StoreError>;

    /// The company token from the most recent successful company attempt.
    fn latest_verified_state(
        &self,
        entry: &EntryId,
    ) -> Result<Option<CompanyMatchToken>, StoreError>;

    /// Replace the cached registry result for `candidate`.
    fn put_registry_result(
        &self,
        candidate: &CandidateId,
        records: &[NationalRegistryRecord],
    ) -> Result<(), StoreError>;

    /// The last registry result stored for `candidate`, if any.
    fn latest_registry_result(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<Vec<NationalRegistryRecord>>, StoreError>;
}

impl<S: VerificationStore + ?Sized> VerificationStore for Arc<S> {
    fn append_attempt(
        &self,
        entry: &EntryId,
        outcome: &VerificationOutcome,
    ) -> Result<(), StoreError> {
        (**self).append_attempt(entry, outcome)
    }

    fn attempts(&self, entry: &EntryId) -> Result<Vec<VerificationOutcome>, StoreError> {
        (**self).attempts(entry)
    }

    fn latest_verified_state(
        &self,
        entry: &EntryId,
    ) -> Result<Option<CompanyMatchToken>, StoreError> {
        (**self).latest_verified_state(entry)
    }

    fn put_registry_result(
        &self,
        candidate: &CandidateId,
        records: &[NationalRegistryRecord],
    ) -> Result<(), StoreError> {
        (**self).put_registry_result(candidate, records)
    }

    fn latest_registry_result(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<Vec<NationalRegistryRecord>>, StoreError> {
        (**self).latest_registry_result(candidate)
    }
}
