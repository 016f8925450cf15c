//! National employment registry lookups.

use bgv_types::{CheckKind, RegistryIdentifier, RegistryResult};

use crate::{CheckPayload, NormalizedResult, ProtocolClient, ProtocolError, Transport};

/// Registry flavour of the protocol client.
///
/// `basic` finds the current employer from a mobile number or PAN; `full`
/// returns the whole employment timeline for a UAN. Overlap flags are passed
/// through exactly as the provider reports them.
pub struct NationalRegistryClient<'a, T> {
    client: &'a ProtocolClient<T>,
}

impl<'a, T: Transport> NationalRegistryClient<'a, T> {
    pub fn new(client: &'a ProtocolClient<T>) -> Self {
        Self { client }
    }

    /// Current-employer lookup. At most one segment comes back.
    pub async fn basic(
        &self,
        identifier: &RegistryIdentifier,
    ) -> Result<RegistryResult, ProtocolError> {
        if matches!(identifier, RegistryIdentifier::Uan(_)) {
            return Err(ProtocolError::PayloadMismatch(CheckKind::RegistryBasic));
        }
        self.lookup(CheckKind::RegistryBasic, identifier).await
    }

    /// Full employment history for a 12-digit UAN.
    pub async fn full(&self, uan: &str) -> Result<RegistryResult, ProtocolError> {
        let identifier = RegistryIdentifier::uan(uan)?;
        self.lookup(CheckKind::RegistryFull, &identifier).await
    }

    /// Pick basic or full from the identifier type.
    pub async fn lookup_any(
        &self,
        identifier: &RegistryIdentifier,
    ) -> Result<RegistryResult, ProtocolError> {
        match identifier {
            RegistryIdentifier::Uan(uan) => self.full(uan).await,
            other => self.basic(other).await,
        }
    }

    async fn lookup(
        &self,
        kind: CheckKind,
        identifier: &RegistryIdentifier,
    ) -> Result<RegistryResult, ProtocolError> {
        identifier.validate()?;
        match self
            .client
            .call(kind, &CheckPayload::Registry(identifier.clone()))
            .await?
        {
            NormalizedResult::Registry(result) => Ok(result),
            _ => Err(ProtocolError::PayloadMismatch(kind)),
        }
    }
}

/// Registry kind that serves `identifier`.
pub fn kind_for(identifier: &RegistryIdentifier) -> CheckKind {
    match identifier {
        RegistryIdentifier::Uan(_) => CheckKind::RegistryFull,
        RegistryIdentifier::Mobile(_) | RegistryIdentifier::Pan(_) => CheckKind::RegistryBasic,
    }
}
