//! Endpoint paths for each provider group and protocol phase.

use bgv_types::CheckKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two independent provider groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderGroup {
    /// Company resolution and employee confirmation.
    Employment,
    /// National employment registry.
    Registry,
}

impl ProviderGroup {
    pub fn for_kind(kind: CheckKind) -> Self {
        if kind.is_registry() {
            Self::Registry
        } else {
            Self::Employment
        }
    }
}

/// One of the three calls that make up a provider check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Encrypt,
    Verify,
    Decrypt,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encrypt => "encrypt",
            Self::Verify => "verify",
            Self::Decrypt => "decrypt",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path of `phase` for `kind`, relative to the group's base URL.
///
/// Employment checks are prefixed with the check name
/// (`/company-encrypt`, `/employee-decrypt`); registry checks share the bare
/// verbs and are told apart by their document-type code.
pub fn path(kind: CheckKind, phase: Phase) -> String {
    match kind {
        CheckKind::Company => format!("/company-{phase}"),
        CheckKind::Employee => format!("/employee-{phase}"),
        CheckKind::RegistryBasic | CheckKind::RegistryFull => format!("/{phase}"),
    }
}
