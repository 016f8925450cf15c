//! Canonical records produced from provider responses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials returned by a successful company resolution.
///
/// Required input to the paired employee confirmation. The provider may
/// invalidate it at any time; the engine only learns of that reactively.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyMatchToken {
    pub establishment_id: String,
    pub company_name: String,
    pub secret_token: String,
    pub transaction_id: String,
}

/// End of an employment segment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentEnd {
    /// Still employed.
    Current,
    /// Left on the given (provider-formatted) date.
    Exited(String),
}

impl EmploymentEnd {
    /// Interpret a provider exit-date field. Blank, `NA`, `N/A` and `-` mean
    /// the person is still employed there.
    pub fn from_provider(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None => Self::Current,
            Some(s) if s.is_empty() || s == "-" => Self::Current,
            Some(s) if s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("n/a") => {
                Self::Current
            }
            Some(s) => Self::Exited(s.to_string()),
        }
    }

    pub fn is_current(&self) -> bool {
        matches!(self, Self::Current)
    }
}

impl fmt::Display for EmploymentEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => f.write_str("currently employed"),
            Self::Exited(date) => write!(f, "exited {date}"),
        }
    }
}

/// Employee confirmation result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub employee_name: String,
    pub establishment_name: String,
    pub member_id: Option<String>,
    pub joined: Option<String>,
    pub exit: EmploymentEnd,
}

/// One employment segment from the national registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NationalRegistryRecord {
    pub establishment_name: String,
    pub member_id: Option<String>,
    pub joined: Option<String>,
    pub exit: EmploymentEnd,
    /// Provider-reported: this segment overlaps another one in time.
    pub overlapping: bool,
}

/// Outcome of a registry lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryResult {
    Records(Vec<NationalRegistryRecord>),
    /// The identifier has no registry record. Informational, not an error.
    NoRecord,
}

impl RegistryResult {
    pub fn records(&self) -> &[NationalRegistryRecord] {
        match self {
            Self::Records(records) => records,
            Self::NoRecord => &[],
        }
    }
}
