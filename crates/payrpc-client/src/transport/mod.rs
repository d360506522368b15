//! Transport layer.
//!
//! The client core only needs `send(endpoint, body) -> raw body`. The HTTP
//! implementation lives in `http`; tests plug in their own.

pub mod http;

use async_trait::async_trait;
use payrpc_core::error::Result;

pub use http::{HttpTransport, USER_AGENT};

/// Delivers a serialized envelope and yields the raw response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, endpoint: &str, body: String) -> Result<String>;
}
