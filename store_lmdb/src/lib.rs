//! LMDB storage backend for the verification engine.
//!
//! Implements the traits from `bgv-store` using the `heed` LMDB bindings.
//! Each logical store maps to one or more LMDB databases within a single
//! environment.

pub mod environment;
pub mod error;
pub mod verification;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use verification::LmdbVerificationStore;
