//! Axum wiring for inbound notifications (HTTP POST -> dispatch -> ack).
//!
//! The endpoint serves an explicit list of clients. Each is tried in order;
//! a client without a listener for the method is skipped, the first
//! acknowledgement is written back, and any other failure ends the attempt.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use payrpc_core::error::{ErrorKind, PayRpcError, Result};
use serde_json::json;

use crate::client::ApiClient;
use crate::dispatch::Acknowledgement;
use crate::transport;

#[derive(Clone)]
pub struct NotificationEndpoint {
    clients: Arc<[ApiClient]>,
}

impl NotificationEndpoint {
    pub fn new(clients: Vec<ApiClient>) -> Result<Self> {
        if clients.is_empty() {
            return Err(PayRpcError::NoClient);
        }
        Ok(Self {
            clients: clients.into(),
        })
    }

    pub fn clients(&self) -> &[ApiClient] {
        &self.clients
    }

    pub async fn handle(&self, body: &str) -> Result<Acknowledgement> {
        let mut unmatched = String::new();
        for client in self.clients.iter() {
            match client.handle_notification(body).await {
                Ok(ack) => return Ok(ack),
                Err(PayRpcError::NoListener(method)) => {
                    tracing::debug!(method = %method, "client has no listener, trying the next one");
                    unmatched = method;
                }
                Err(e) => return Err(e),
            }
        }
        Err(PayRpcError::NoListener(unmatched))
    }
}

pub fn notification_router(endpoint: NotificationEndpoint, path: &str) -> Router {
    Router::new()
        .route(path, post(receive))
        .with_state(endpoint)
}

async fn receive(
    State(endpoint): State<NotificationEndpoint>,
    body: Bytes,
) -> std::result::Result<Response, HttpError> {
    let text = std::str::from_utf8(&body)
        .map_err(|e| PayRpcError::Validation(format!("notification body is not utf-8: {e}")))?;

    let ack = endpoint.handle(text).await?;
    let json = ack.to_json()?;
    let status =
        StatusCode::from_u16(ack.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    Ok((
        status,
        [
            (CONTENT_TYPE, "application/json"),
            (ACCEPT, "application/json"),
            (USER_AGENT, transport::USER_AGENT),
        ],
        json,
    )
        .into_response())
}

/// HTTP rendering of a [`PayRpcError`].
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct HttpError(#[from] pub PayRpcError);

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Signature => StatusCode::UNAUTHORIZED,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NoListener => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(kind = self.0.kind().as_str(), error = %self.0, "notification not acknowledged");
        let body = json!({
            "error": self.0.kind().as_str(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
