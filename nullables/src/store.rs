//! Thread-safe in-memory store for tests.

use bgv_store::{StoreError, VerificationStore};
use bgv_types::{
    CandidateId, CompanyMatchToken, EntryId, NationalRegistryRecord, VerificationOutcome,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// An in-memory verification store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
///
/// Writes can be made to fail with [`NullVerificationStore::fail_writes`]
/// to exercise the engine's persistence-warning path.
#[derive(Default)]
pub struct NullVerificationStore {
    attempts: Mutex<HashMap<EntryId, Vec<VerificationOutcome>>>,
    tokens: Mutex<HashMap<EntryId, CompanyMatchToken>>,
    registry: Mutex<HashMap<CandidateId, Vec<NationalRegistryRecord>>>,
    failing: AtomicBool,
}

impl NullVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Total attempts recorded across all entries.
    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().values().map(Vec::len).sum()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Backend("writes disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

impl VerificationStore for NullVerificationStore {
    fn append_attempt(
        &self,
        entry: &EntryId,
        outcome: &VerificationOutcome,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        if let Some(token) = outcome.company_token() {
            self.tokens
                .lock()
                .unwrap()
                .insert(entry.clone(), token.clone());
        }
        self.attempts
            .lock()
            .unwrap()
            .entry(entry.clone())
            .or_default()
            .push(outcome.clone());
        Ok(())
    }

    fn attempts(&self, entry: &EntryId) -> Result<Vec<VerificationOutcome>, StoreError> {
        Ok(self
            .attempts
            .lock()
            .unwrap()
            .get(entry)
            .cloned()
            .unwrap_or_default())
    }

    fn latest_verified_state(
        &self,
        entry: &EntryId,
    ) -> Result<Option<CompanyMatchToken>, StoreError> {
        Ok(self.tokens.lock().unwrap().get(entry).cloned())
    }

    fn put_registry_result(
        &self,
        candidate: &CandidateId,
        records: &[NationalRegistryRecord],
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        self.registry
            .lock()
            .unwrap()
            .insert(candidate.clone(), records.to_vec());
        Ok(())
    }

    fn latest_registry_result(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<Vec<NationalRegistryRecord>>, StoreError> {
        Ok(self.registry.lock().unwrap().get(candidate).cloned())
    }
}
