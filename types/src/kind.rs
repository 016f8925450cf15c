//! The four provider checks the engine knows how to run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which remote check a protocol call performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckKind {
    /// Resolve a free-form employer name to a registered establishment.
    Company,
    /// Confirm the candidate is (or was) employed at a resolved establishment.
    Employee,
    /// Current-employer lookup by mobile number or PAN.
    RegistryBasic,
    /// Full employment timeline by UAN.
    RegistryFull,
}

impl CheckKind {
    pub const ALL: [CheckKind; 4] = [
        CheckKind::Company,
        CheckKind::Employee,
        CheckKind::RegistryBasic,
        CheckKind::RegistryFull,
    ];

    /// Fixed document-type code sent with every encrypt request of this kind.
    pub fn document_type(&self) -> &'static str {
        match self {
            Self::Company => "CMP-RESOLVE",
            Self::Employee => "EMP-CONFIRM",
            Self::RegistryBasic => "UAN-BASIC",
            Self::RegistryFull => "UAN-FULL",
        }
    }

    /// Whether this check goes to the national registry provider group.
    pub fn is_registry(&self) -> bool {
        matches!(self, Self::RegistryBasic | Self::RegistryFull)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Employee => "employee",
            Self::RegistryBasic => "registry_basic",
            Self::RegistryFull => "registry_full",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
