//! Candidate-reported work-history entries and their verification state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    CandidateId, CompanyMatchToken, EmployeeRecord, EntryId, ErrorCategory, Timestamp,
    VerificationStatus,
};

/// Why an entry ended up in a failed state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub category: ErrorCategory,
    pub message: String,
    /// Attempts spent in the budget that produced this failure.
    pub attempts: u32,
    /// The retry budget ran out.
    pub exhausted: bool,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exhausted {
            write!(f, "{} (gave up after {} attempts)", self.message, self.attempts)
        } else {
            f.write_str(&self.message)
        }
    }
}

/// A transient failure is waiting on a scheduled retry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryNotice {
    /// Attempts spent so far.
    pub attempt: u32,
    pub max_attempts: u32,
    pub next_attempt_at: Timestamp,
}

/// One row of a candidate's reported employment history.
///
/// Only the verification engine mutates the verification fields, and only
/// through state-machine transitions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkHistoryEntry {
    pub id: EntryId,
    pub candidate: CandidateId,
    /// Name the candidate is employed under; sent with employee confirmation.
    pub employee_name: String,
    /// Employer name as the candidate typed it.
    pub employer_name: String,
    #[serde(default)]
    pub designation: String,
    /// Free-form date range, e.g. `"Jan 2019 - Present"`.
    #[serde(default)]
    pub tenure: String,

    #[serde(default)]
    pub status: VerificationStatus,
    /// The most recently minted company token. Never a stale one.
    #[serde(default)]
    pub active_token: Option<CompanyMatchToken>,
    #[serde(default)]
    pub employee_record: Option<EmployeeRecord>,
    #[serde(default)]
    pub last_failure: Option<FailureReason>,
    #[serde(default)]
    pub retry: Option<RetryNotice>,
}

impl WorkHistoryEntry {
    pub fn new(
        id: impl Into<String>,
        candidate: impl Into<String>,
        employee_name: impl Into<String>,
        employer_name: impl Into<String>,
    ) -> Self {
        Self {
            id: EntryId::new(id),
            candidate: CandidateId::new(candidate),
            employee_name: employee_name.into(),
            employer_name: employer_name.into(),
            designation: String::new(),
            tenure: String::new(),
            status: VerificationStatus::Unverified,
            active_token: None,
            employee_record: None,
            last_failure: None,
            retry: None,
        }
    }

    pub fn with_designation(mut self, designation: impl Into<String>) -> Self {
        self.designation = designation.into();
        self
    }

    pub fn with_tenure(mut self, tenure: impl Into<String>) -> Self {
        self.tenure = tenure.into();
        self
    }
}
