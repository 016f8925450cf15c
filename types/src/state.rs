//! Per-entry verification status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a work-history entry sits in the verification lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStatus {
    /// Nothing has been attempted yet.
    #[default]
    Unverified,
    /// Company resolution is running (or waiting on a retry).
    CompanyVerifying,
    /// An establishment was resolved; its token is active on the entry.
    CompanyVerified,
    /// Employee confirmation is running (or waiting on a retry).
    EmployeeVerifying,
    /// Employment confirmed. Terminal success.
    EmployeeVerified,
    /// Company resolution ended without a match.
    CompanyFailed,
    /// Employee confirmation ended without a match.
    EmployeeFailed,
}

impl VerificationStatus {
    /// Whether verification has settled (success or failure).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::EmployeeVerified | Self::CompanyFailed | Self::EmployeeFailed
        )
    }

    /// Terminal success: re-verifying must not touch the network.
    pub fn is_fully_verified(&self) -> bool {
        matches!(self, Self::EmployeeVerified)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::CompanyFailed | Self::EmployeeFailed)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::CompanyVerifying | Self::EmployeeVerifying)
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unverified => "not verified",
            Self::CompanyVerifying => "verifying company",
            Self::CompanyVerified => "company verified",
            Self::EmployeeVerifying => "verifying employment",
            Self::EmployeeVerified => "employment verified",
            Self::CompanyFailed => "company verification failed",
            Self::EmployeeFailed => "employment verification failed",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_employee_verified_is_fully_verified() {
        let all = [
            VerificationStatus::Unverified,
            VerificationStatus::CompanyVerifying,
            VerificationStatus::CompanyVerified,
            VerificationStatus::EmployeeVerifying,
            VerificationStatus::EmployeeVerified,
            VerificationStatus::CompanyFailed,
            VerificationStatus::EmployeeFailed,
        ];
        let verified: Vec<_> = all.iter().filter(|s| s.is_fully_verified()).collect();
        assert_eq!(verified, vec![&VerificationStatus::EmployeeVerified]);
    }

    #[test]
    fn failures_are_terminal_but_not_verified() {
        assert!(VerificationStatus::CompanyFailed.is_terminal());
        assert!(VerificationStatus::EmployeeFailed.is_terminal());
        assert!(!VerificationStatus::CompanyFailed.is_fully_verified());
        assert!(!VerificationStatus::CompanyVerified.is_terminal());
    }
}
