//! Storage traits for the verification engine.
//!
//! Every backend (LMDB for production, in-memory for tests) implements
//! these traits. The engine depends only on the traits.

pub mod error;
pub mod verification;

pub use error::StoreError;
pub use verification::VerificationStore;
