//! Shared error type across payrpc crates.

use serde_json::Value;
use thiserror::Error;

/// Stable error categories (used in logs, HTTP bodies and tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or incomplete envelope, or a correlation id mismatch.
    Validation,
    /// Blank, malformed or cryptographically invalid signature.
    Signature,
    /// The counterparty answered with an error arm.
    Remote,
    /// The counterparty declined the request inside a successful response.
    Rejection,
    /// No handler registered for an inbound notification method.
    NoListener,
    /// Handlers ran but none of them acknowledged the notification.
    Unacknowledged,
    /// Network or HTTP failure.
    Transport,
    /// Invalid settings or key material.
    Config,
    /// Internal error.
    Internal,
}

impl ErrorKind {
    /// String representation used in JSON bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Signature => "SIGNATURE",
            ErrorKind::Remote => "REMOTE",
            ErrorKind::Rejection => "REJECTION",
            ErrorKind::NoListener => "NO_LISTENER",
            ErrorKind::Unacknowledged => "UNACKNOWLEDGED",
            ErrorKind::Transport => "TRANSPORT",
            ErrorKind::Config => "CONFIG",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PayRpcError>;

/// Error arm returned by the counterparty.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFailure {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub name: Option<String>,
    /// Nested `error.error` node, kept exactly as received.
    pub detail: Option<Value>,
    /// Wire text of `detail`, which is what its signature covers.
    pub detail_raw: Option<String>,
}

impl RemoteFailure {
    /// Best human readable description: message, then name, then code.
    pub fn describe(&self) -> String {
        if let Some(m) = self.message.as_deref().filter(|m| !is_blank(m)) {
            return m.to_string();
        }
        if let Some(n) = self.name.as_deref().filter(|n| !is_blank(n)) {
            return n.to_string();
        }
        self.code.unwrap_or(-1).to_string()
    }
}

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum PayRpcError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("there was no expected signature given, the payload seems malformed")]
    SignatureMissing,
    #[error("signature check failed: {0}")]
    Signature(String),
    #[error("received an error response from the API: {}", .0.describe())]
    Remote(RemoteFailure),
    #[error("received a rejection response from the API: {}", rejection_text(.reason))]
    Rejection { reason: Option<String> },
    #[error("there is no listener for incoming notification '{0}' nor for unknown ones")]
    NoListener(String),
    #[error("no handler responded with OK or FAILED for notification '{0}'")]
    Unacknowledged(String),
    #[error("no clients were given to the notification endpoint")]
    NoClient,
    #[error("transport: {0}")]
    Transport(String),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("key: {0}")]
    Key(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PayRpcError {
    /// Map to a stable category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PayRpcError::Validation(_) | PayRpcError::Json(_) => ErrorKind::Validation,
            PayRpcError::SignatureMissing | PayRpcError::Signature(_) => ErrorKind::Signature,
            PayRpcError::Remote(_) => ErrorKind::Remote,
            PayRpcError::Rejection { .. } => ErrorKind::Rejection,
            PayRpcError::NoListener(_) => ErrorKind::NoListener,
            PayRpcError::Unacknowledged(_) => ErrorKind::Unacknowledged,
            PayRpcError::Transport(_) => ErrorKind::Transport,
            PayRpcError::Key(_) | PayRpcError::Config(_) | PayRpcError::NoClient => {
                ErrorKind::Config
            }
            PayRpcError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Caller-facing failure of an outbound call.
///
/// Whatever stopped the call (transport, remote error, rejection, signature,
/// validation), callers catch this one type and inspect [`RequestError::cause`].
#[derive(Debug, Error)]
#[error("the request did not complete: {source}")]
pub struct RequestError {
    #[source]
    source: PayRpcError,
}

impl RequestError {
    pub fn cause(&self) -> &PayRpcError {
        &self.source
    }

    pub fn into_cause(self) -> PayRpcError {
        self.source
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

impl From<PayRpcError> for RequestError {
    fn from(source: PayRpcError) -> Self {
        Self { source }
    }
}

/// Blank means empty or whitespace only.
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn rejection_text(reason: &Option<String>) -> &str {
    match reason.as_deref() {
        Some(r) if !is_blank(r) => r,
        _ => "The request was rejected for an unknown reason",
    }
}
