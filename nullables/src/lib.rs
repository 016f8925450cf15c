//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the engine (clock, provider network, storage)
//! sits behind a trait. This crate provides test-friendly implementations
//! that:
//! - Return deterministic values
//! - Can be scripted and inspected programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod provider;
pub mod store;

pub use clock::NullClock;
pub use provider::{NullProvider, Reply};
pub use store::NullVerificationStore;
