//! LMDB implementation of VerificationStore.
//!
//! Attempts use composite keys `entry_id ++ 0x00 ++ seq_be` so each attempt
//! is its own LMDB key/value pair and keys sort in append order. Listing all
//! attempts for an entry is a range-scan over `[entry ++ 0x00, entry ++ 0x01)`.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use bgv_store::verification::VerificationStore;
use bgv_store::StoreError;
use bgv_types::{
    CandidateId, CompanyMatchToken, EntryId, NationalRegistryRecord, VerificationOutcome,
};

use crate::LmdbError;

const KEY_SEPARATOR: u8 = 0x00;

pub struct LmdbVerificationStore {
    pub(crate) env: Arc<Env>,
    pub(crate) attempts_db: Database<Bytes, Bytes>,
    pub(crate) tokens_db: Database<Bytes, Bytes>,
    pub(crate) registry_db: Database<Bytes, Bytes>,
}

/// Build the attempt key `entry ++ 0x00 ++ seq_be`.
fn attempt_key(entry: &EntryId, seq: u32) -> Vec<u8> {
    let e = entry.as_str().as_bytes();
    let mut key = Vec::with_capacity(e.len() + 5);
    key.extend_from_slice(e);
    key.push(KEY_SEPARATOR);
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

/// Inclusive lower and exclusive upper bound for one entry's attempts.
fn attempt_bounds(entry: &EntryId) -> (Vec<u8>, Vec<u8>) {
    let e = entry.as_str().as_bytes();
    let mut lower = e.to_vec();
    lower.push(KEY_SEPARATOR);
    let mut upper = e.to_vec();
    upper.push(KEY_SEPARATOR + 1);
    (lower, upper)
}

impl LmdbVerificationStore {
    fn scan_attempts(&self, rtxn: &RoTxn, entry: &EntryId) -> Result<Vec<Vec<u8>>, LmdbError> {
        let (lower, upper) = attempt_bounds(entry);
        let bounds = (
            Bound::Included(lower.as_slice()),
            Bound::Excluded(upper.as_slice()),
        );
        let mut values = Vec::new();
        for result in self.attempts_db.range(rtxn, &bounds)? {
            let (_key, val) = result?;
            values.push(val.to_vec());
        }
        Ok(values)
    }

    fn next_sequence(&self, rtxn: &RoTxn, entry: &EntryId) -> Result<u32, LmdbError> {
        let (lower, upper) = attempt_bounds(entry);
        let bounds = (
            Bound::Included(lower.as_slice()),
            Bound::Excluded(upper.as_slice()),
        );
        let last = self.attempts_db.rev_range(rtxn, &bounds)?.next().transpose()?;
        match last {
            None => Ok(0),
            Some((key, _)) => {
                let tail = key
                    .get(key.len().saturating_sub(4)..)
                    .and_then(|b| <[u8; 4]>::try_from(b).ok())
                    .ok_or_else(|| {
                        LmdbError::Serialization(format!("malformed attempt key for {entry}"))
                    })?;
                Ok(u32::from_be_bytes(tail).saturating_add(1))
            }
        }
    }
}

impl VerificationStore for LmdbVerificationStore {
    fn append_attempt(
        &self,
        entry: &EntryId,
        outcome: &VerificationOutcome,
    ) -> Result<(), StoreError> {
        let value = bincode::serialize(outcome).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let seq = self.next_sequence(&wtxn, entry)?;
        self.attempts_db
            .put(&mut wtxn, &attempt_key(entry, seq), &value)
            .map_err(LmdbError::from)?;

        if let Some(token) = outcome.company_token() {
            let token_bytes = bincode::serialize(token).map_err(LmdbError::from)?;
            self.tokens_db
                .put(&mut wtxn, entry.as_str().as_bytes(), &token_bytes)
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::trace!(%entry, seq, kind = %outcome.kind, "attempt recorded");
        Ok(())
    }

    fn attempts(&self, entry: &EntryId) -> Result<Vec<VerificationOutcome>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        self.scan_attempts(&rtxn, entry)?
            .iter()
            .map(|bytes| {
                bincode::deserialize(bytes).map_err(|e| StoreError::from(LmdbError::from(e)))
            })
            .collect()
    }

    fn latest_verified_state(
        &self,
        entry: &EntryId,
    ) -> Result<Option<CompanyMatchToken>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .tokens_db
            .get(&rtxn, entry.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn put_registry_result(
        &self,
        candidate: &CandidateId,
        records: &[NationalRegistryRecord],
    ) -> Result<(), StoreError> {
        let value = bincode::serialize(records).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.registry_db
            .put(&mut wtxn, candidate.as_str().as_bytes(), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn latest_registry_result(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<Vec<NationalRegistryRecord>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .registry_db
            .get(&rtxn, candidate.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }
}
