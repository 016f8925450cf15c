//! Input validation errors raised before any provider call is made.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("UAN must be exactly 12 digits, got {0:?}")]
    InvalidUan(String),

    #[error("mobile number must be exactly 10 digits, got {0:?}")]
    InvalidMobile(String),

    #[error("PAN must look like AAAAA9999A, got {0:?}")]
    InvalidPan(String),

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}
