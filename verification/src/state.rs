//! Verification state machine.
//!
//! ```text
//! Unverified ──► CompanyVerifying ──► CompanyVerified ──► EmployeeVerifying ──► EmployeeVerified
//!                    │      ▲                                   │    │
//!                    ▼      └──────── token refresh ────────────┘    ▼
//!              CompanyFailed                                   EmployeeFailed
//! ```
//!
//! Both failed states may be re-triggered manually. A registry match may
//! confirm any entry that is not yet verified.

use bgv_types::VerificationStatus;
use std::fmt;
use thiserror::Error;

/// An event that moves an entry between statuses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Start (or re-enter, on retry) company resolution.
    BeginCompany,
    CompanyMatched,
    CompanyFailed,
    /// Start (or re-enter, on retry) employee confirmation.
    BeginEmployee,
    EmployeeConfirmed,
    EmployeeFailed,
    /// The provider invalidated the company token mid-confirmation.
    TokenRefresh,
    /// The national registry shows the candidate at this employer.
    RegistryMatched,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BeginCompany => "begin company",
            Self::CompanyMatched => "company matched",
            Self::CompanyFailed => "company failed",
            Self::BeginEmployee => "begin employee",
            Self::EmployeeConfirmed => "employee confirmed",
            Self::EmployeeFailed => "employee failed",
            Self::TokenRefresh => "token refresh",
            Self::RegistryMatched => "registry matched",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("illegal transition '{transition}' from status '{from}'")]
pub struct TransitionError {
    pub from: VerificationStatus,
    pub transition: Transition,
}

/// Compute the status `transition` leads to from `from`.
///
/// Pure: callers apply the returned status themselves, so a rejected
/// transition leaves the entry untouched.
pub fn next_status(
    from: VerificationStatus,
    transition: Transition,
) -> Result<VerificationStatus, TransitionError> {
    use Transition as T;
    use VerificationStatus as S;

    let to = match (from, transition) {
        (S::Unverified | S::CompanyVerifying | S::CompanyFailed | S::EmployeeFailed, T::BeginCompany) => {
            S::CompanyVerifying
        }
        (S::CompanyVerifying, T::CompanyMatched) => S::CompanyVerified,
        (S::CompanyVerifying, T::CompanyFailed) => S::CompanyFailed,
        (S::CompanyVerified | S::EmployeeVerifying | S::EmployeeFailed, T::BeginEmployee) => {
            S::EmployeeVerifying
        }
        (S::EmployeeVerifying, T::EmployeeConfirmed) => S::EmployeeVerified,
        (S::EmployeeVerifying, T::EmployeeFailed) => S::EmployeeFailed,
        (S::EmployeeVerifying, T::TokenRefresh) => S::CompanyVerifying,
        (from, T::RegistryMatched) if !from.is_fully_verified() => S::EmployeeVerified,
        (from, transition) => return Err(TransitionError { from, transition }),
    };
    Ok(to)
}
