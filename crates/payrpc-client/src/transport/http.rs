use std::time::Duration;

use async_trait::async_trait;
use payrpc_core::error::{PayRpcError, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use super::Transport;

pub const USER_AGENT: &str = concat!("payrpc-client-rust/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body carried into a `Transport` error.
const ERROR_BODY_PREVIEW: usize = 256;

/// reqwest-backed POST transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PayRpcError::Transport(format!("http client init failed: {e}")))?;
        Ok(Self { http })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, endpoint: &str, body: String) -> Result<String> {
        let response = self
            .http
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| PayRpcError::Transport(format!("request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PayRpcError::Transport(format!("read response failed: {e}")))?;

        if !status.is_success() {
            let preview: String = text.chars().take(ERROR_BODY_PREVIEW).collect();
            tracing::warn!(status = %status, "counterparty answered with a non-success status");
            return Err(PayRpcError::Transport(format!(
                "received error response {status}: {preview}"
            )));
        }

        Ok(text)
    }
}
