use bgv_types::EntryId;
use thiserror::Error;

use crate::state::TransitionError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("entry {0} is not tracked by this engine")]
    UnknownEntry(EntryId),

    #[error("entry {0} is already being verified")]
    AlreadyInFlight(EntryId),

    #[error("entry {0} is already tracked")]
    AlreadyTracked(EntryId),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("protocol error: {0}")]
    Protocol(#[from] bgv_protocol::ProtocolError),

    #[error("store error: {0}")]
    Store(#[from] bgv_store::StoreError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("engine has been torn down")]
    TornDown,
}
