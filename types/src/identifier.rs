//! National-registry identifiers and their format checks.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ValidationError;

/// An identifier accepted by the registry provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistryIdentifier {
    /// Universal Account Number: 12 digits. Used for full-history lookups.
    Uan(String),
    /// 10-digit mobile number. Used for basic lookups.
    Mobile(String),
    /// Permanent Account Number, `AAAAA9999A`. Used for basic lookups.
    Pan(String),
}

impl RegistryIdentifier {
    pub fn uan(raw: &str) -> Result<Self, ValidationError> {
        let s = raw.trim();
        if is_digits(s, 12) {
            Ok(Self::Uan(s.to_string()))
        } else {
            Err(ValidationError::InvalidUan(raw.to_string()))
        }
    }

    pub fn mobile(raw: &str) -> Result<Self, ValidationError> {
        let s = raw.trim();
        if is_digits(s, 10) {
            Ok(Self::Mobile(s.to_string()))
        } else {
            Err(ValidationError::InvalidMobile(raw.to_string()))
        }
    }

    /// PANs are case-insensitive on input and stored upper-cased.
    pub fn pan(raw: &str) -> Result<Self, ValidationError> {
        let s = raw.trim().to_ascii_uppercase();
        let b = s.as_bytes();
        let well_formed = b.len() == 10
            && b[..5].iter().all(u8::is_ascii_uppercase)
            && b[5..9].iter().all(u8::is_ascii_digit)
            && b[9].is_ascii_uppercase();
        if well_formed {
            Ok(Self::Pan(s))
        } else {
            Err(ValidationError::InvalidPan(raw.to_string()))
        }
    }

    /// Re-check an identifier that may have been built directly or deserialized.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Uan(s) => Self::uan(s).map(|_| ()),
            Self::Mobile(s) => Self::mobile(s).map(|_| ()),
            Self::Pan(s) => Self::pan(s).map(|_| ()),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Uan(s) | Self::Mobile(s) | Self::Pan(s) => s,
        }
    }

    /// Request field name the registry provider expects for this identifier.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Uan(_) => "uan",
            Self::Mobile(_) => "mobile",
            Self::Pan(_) => "pan",
        }
    }
}

impl fmt::Display for RegistryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field_name(), self.value())
    }
}

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}
