//! Top-level facade crate for payrpc.
//!
//! Re-exports the protocol primitives and the client library so users can
//! depend on a single crate.

pub mod core {
    pub use payrpc_core::*;
}

pub mod client {
    pub use payrpc_client::*;
}

pub use payrpc_client::{ApiClient, ClientSettings};
pub use payrpc_core::{PayRpcError, RequestError};
