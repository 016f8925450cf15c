use bgv_types::{CheckKind, ErrorCategory, ValidationError};
use thiserror::Error;

use crate::Phase;

/// A single HTTP exchange failed before a usable response arrived.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0} with no usable body")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(String),
}

/// A decrypt payload could not be mapped onto a canonical record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("required field `{0}` is missing")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("payload does not match check kind {0}")]
    PayloadMismatch(CheckKind),

    #[error("{kind} encrypt failed: {reason}")]
    Encryption { kind: CheckKind, reason: String },

    #[error("{kind} decrypt failed: {reason}")]
    Decryption { kind: CheckKind, reason: String },

    #[error("{kind} {phase} call failed: {source}")]
    Transport {
        kind: CheckKind,
        phase: Phase,
        #[source]
        source: TransportError,
    },

    #[error("{kind} provider unavailable: {message}")]
    ProviderUnavailable { kind: CheckKind, message: String },

    #[error("{kind}: {message}")]
    NotFound { kind: CheckKind, message: String },

    #[error("{kind} rejected by provider (status {status}): {message}")]
    Rejected {
        kind: CheckKind,
        status: i64,
        message: String,
    },

    #[error("company token expired, re-authentication required")]
    TokenExpired,
}

impl ProtocolError {
    /// Classify this error for the retry / settle decision.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::PayloadMismatch(_) => ErrorCategory::Validation,
            Self::Encryption { .. }
            | Self::Decryption { .. }
            | Self::Transport { .. }
            | Self::ProviderUnavailable { .. } => ErrorCategory::Transient,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Rejected { .. } => ErrorCategory::Rejected,
            Self::TokenExpired => ErrorCategory::TokenExpired,
        }
    }
}
