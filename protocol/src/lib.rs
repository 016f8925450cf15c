//! Provider protocol client.
//!
//! Every provider check is three ordered POSTs against one provider group:
//! 1. **encrypt** the plaintext request into an opaque `requestData` blob,
//! 2. **verify** that blob, receiving an opaque `responseData` blob,
//! 3. **decrypt** the response into a status code plus a result payload.
//!
//! The [`normalizer`] turns the provider's inconsistently named result
//! payloads into canonical records, and [`ProtocolError::category`]
//! classifies every failure so callers can decide between retrying,
//! refreshing a token, or settling.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod normalizer;
pub mod registry;
pub mod transport;

pub use client::{CheckPayload, NormalizedResult, ProtocolClient};
pub use endpoint::{Phase, ProviderGroup};
pub use error::{NormalizeError, ProtocolError, TransportError};
pub use registry::NationalRegistryClient;
pub use transport::{HttpTransport, ProviderConfig, Transport, TransportResponse};
