//! One row per provider attempt, and the error taxonomy that classifies it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    CheckKind, CompanyMatchToken, EmployeeRecord, EntryId, NationalRegistryRecord, Timestamp,
};

/// Classified reason an attempt did not succeed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Malformed input, rejected before any network call.
    Validation,
    /// Timeout, connection failure, provider not responding. Retried.
    Transient,
    /// Provider explicitly found no match / record / employee.
    NotFound,
    /// Any other provider failure status. Conclusive.
    Rejected,
    /// Company token invalidated during employee confirmation.
    TokenExpired,
    /// The durable log write failed.
    Persistence,
}

impl ErrorCategory {
    /// Eligible for a scheduled retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }

    /// A definitive answer: no automatic retry.
    pub fn is_conclusive(&self) -> bool {
        matches!(self, Self::Validation | Self::NotFound | Self::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transient => "transient",
            Self::NotFound => "not_found",
            Self::Rejected => "rejected",
            Self::TokenExpired => "token_expired",
            Self::Persistence => "persistence",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical values matched by a successful attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchedValues {
    Company(CompanyMatchToken),
    Employee(EmployeeRecord),
    Registry(Vec<NationalRegistryRecord>),
}

/// Append-only record of a single protocol call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub entry: EntryId,
    pub kind: CheckKind,
    pub success: bool,
    pub matched: Option<MatchedValues>,
    pub category: Option<ErrorCategory>,
    pub message: Option<String>,
    /// 1-based attempt number within the current retry budget.
    pub attempt: u32,
    pub recorded_at: Timestamp,
}

impl VerificationOutcome {
    pub fn success(
        entry: EntryId,
        kind: CheckKind,
        matched: MatchedValues,
        attempt: u32,
        recorded_at: Timestamp,
    ) -> Self {
        Self {
            entry,
            kind,
            success: true,
            matched: Some(matched),
            category: None,
            message: None,
            attempt,
            recorded_at,
        }
    }

    pub fn failure(
        entry: EntryId,
        kind: CheckKind,
        category: ErrorCategory,
        message: impl Into<String>,
        attempt: u32,
        recorded_at: Timestamp,
    ) -> Self {
        Self {
            entry,
            kind,
            success: false,
            matched: None,
            category: Some(category),
            message: Some(message.into()),
            attempt,
            recorded_at,
        }
    }

    /// The company token carried by a successful company attempt.
    pub fn company_token(&self) -> Option<&CompanyMatchToken> {
        match &self.matched {
            Some(MatchedValues::Company(token)) if self.success => Some(token),
            _ => None,
        }
    }

    /// The employee record carried by a successful employee attempt.
    pub fn employee_record(&self) -> Option<&EmployeeRecord> {
        match &self.matched {
            Some(MatchedValues::Employee(record)) if self.success => Some(record),
            _ => None,
        }
    }
}
