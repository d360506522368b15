//! payrpc core: transport-agnostic protocol primitives, signatures, and errors.
//!
//! This crate defines the canonical serialization, the RSA signature engine and
//! the envelope shapes shared by the client, the notification endpoint and the
//! tests. It carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `PayRpcError`/`Result`, so hostile or
//! malformed payloads from the network never abort the process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorKind, PayRpcError, RequestError, Result};
