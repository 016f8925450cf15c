//! Shared data model for the background-verification engine.
//!
//! This crate defines the types every other crate in the workspace speaks:
//! identifiers, work-history entries, provider records, attempt outcomes,
//! verification statuses, timestamps and engine parameters.

pub mod entry;
pub mod error;
pub mod identifier;
pub mod ids;
pub mod kind;
pub mod outcome;
pub mod params;
pub mod records;
pub mod state;
pub mod time;

pub use entry::{FailureReason, RetryNotice, WorkHistoryEntry};
pub use error::ValidationError;
pub use identifier::RegistryIdentifier;
pub use ids::{CandidateId, EntryId, TransactionId};
pub use kind::CheckKind;
pub use outcome::{ErrorCategory, MatchedValues, VerificationOutcome};
pub use params::EngineParams;
pub use records::{
    CompanyMatchToken, EmployeeRecord, EmploymentEnd, NationalRegistryRecord, RegistryResult,
};
pub use state::VerificationStatus;
pub use time::{Clock, SystemClock, Timestamp};
