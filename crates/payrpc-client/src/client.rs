//! API client: request lifecycle and notification intake.
//!
//! Outbound: `Unsigned -> Signed -> Sent -> {Succeeded | Failed}`. Every
//! failure of [`ApiClient::send_request`] surfaces as one [`RequestError`].
//!
//! Inbound: notifications are verified against the wire node, run through the
//! dispatch table, and answered with a signed acknowledgement.

use std::sync::Arc;

use payrpc_core::error::{is_blank, PayRpcError, RequestError, Result};
use payrpc_core::protocol::{
    Envelope, RsaSigner, Signer, SignerExt, UnsignedEnvelope, WireEnvelope, WireResponse,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::dispatch::{AckPolicy, Acknowledgement, NotificationHandler, NotificationTable};
use crate::methods::notification;
use crate::settings::ClientSettings;
use crate::transport::{HttpTransport, Transport};

const KEY_USERNAME: &str = "Username";
const KEY_PASSWORD: &str = "Password";

/// Cheap to clone; clones share settings, keys, transport and handlers.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    settings: ClientSettings,
    signer: Arc<dyn Signer>,
    transport: Arc<dyn Transport>,
    notifications: NotificationTable,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("settings", &self.inner.settings)
            .field("notification_methods", &self.inner.notifications.registered_methods())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// RSA signer from the settings' keys plus the reqwest transport.
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let signer = RsaSigner::new(
            settings.client_private_key.clone(),
            settings.remote_public_key.clone(),
        );
        let transport = HttpTransport::new(settings.timeout)?;
        Ok(Self::with_parts(settings, Arc::new(signer), Arc::new(transport)))
    }

    pub fn with_parts(
        settings: ClientSettings,
        signer: Arc<dyn Signer>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                signer,
                transport,
                notifications: NotificationTable::new(),
            }),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.inner.settings
    }

    pub fn signer(&self) -> &dyn Signer {
        self.inner.signer.as_ref()
    }

    fn ack_policy(&self) -> AckPolicy {
        AckPolicy {
            include_message: self.inner.settings.include_message_in_notification_response,
            include_exception_message: self
                .inner
                .settings
                .include_exception_message_in_notification_response,
        }
    }

    // ---- outbound ----

    /// Unsigned envelope; a fresh id is generated when `uuid` is `None`.
    pub fn create_request<D>(
        &self,
        data: D,
        method: impl Into<String>,
        uuid: Option<String>,
    ) -> UnsignedEnvelope<D> {
        UnsignedEnvelope::new(method, uuid, data)
    }

    pub fn sign<D: Serialize>(&self, unsigned: UnsignedEnvelope<D>) -> Result<Envelope<D>> {
        let signed = self.inner.signer.sign_request(unsigned)?;
        tracing::debug!(method = %signed.method(), uuid = %signed.uuid(), "request signed");
        Ok(signed)
    }

    /// Inject credentials into `data` and sign. `data` must serialize to a
    /// mapping; credential keys already present are overwritten.
    pub fn create_request_package<T: Serialize>(
        &self,
        data: &T,
        method: &str,
        uuid: Option<String>,
    ) -> Result<Envelope<Value>> {
        let data = self.with_credentials(serde_json::to_value(data)?)?;
        self.sign(self.create_request(data, method, uuid))
    }

    fn with_credentials(&self, data: Value) -> Result<Value> {
        let mut map: Map<String, Value> = match data {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => {
                return Err(PayRpcError::Validation(
                    "request data must be a json object".into(),
                ))
            }
        };
        map.insert(
            KEY_USERNAME.to_string(),
            Value::String(self.inner.settings.username.clone()),
        );
        map.insert(
            KEY_PASSWORD.to_string(),
            Value::String(self.inner.settings.password.clone()),
        );
        Ok(Value::Object(map))
    }

    /// Serialize and hand to the transport; yields the raw response body.
    pub async fn send<D: Serialize>(&self, signed: &Envelope<D>) -> Result<String> {
        let body = signed.to_request_json()?;
        tracing::debug!(method = %signed.method(), uuid = %signed.uuid(), "sending request");
        self.inner
            .transport
            .send(&self.inner.settings.url, body)
            .await
    }

    /// Check a raw response against the request it answers.
    ///
    /// Order: arms, remote error, rejection, signature over the wire node,
    /// correlation id. Only then is the data reconstructed into `R`.
    pub fn parse_and_validate<R: DeserializeOwned>(
        &self,
        raw: &str,
        request_uuid: &str,
    ) -> Result<Envelope<R>> {
        let result = match WireResponse::parse(raw)? {
            WireResponse::Result(result) => result,
            WireResponse::Error(failure) => {
                tracing::warn!(
                    code = ?failure.code,
                    name = ?failure.name,
                    uuid = %request_uuid,
                    "remote error response"
                );
                return Err(PayRpcError::Remote(failure));
            }
        };

        assert_without_rejection(&result)?;

        self.inner.signer.verify_response(&result)?;

        if is_blank(&result.uuid) || result.uuid != request_uuid {
            return Err(PayRpcError::Validation(format!(
                "incoming uuid is not valid, expected {request_uuid} but got back {}",
                result.uuid
            )));
        }
        tracing::debug!(method = %result.method, uuid = %result.uuid, "response verified");

        result.decode()
    }

    /// Full round trip with a generated id.
    pub async fn send_request<T, R>(&self, data: &T, method: &str) -> std::result::Result<R, RequestError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        self.send_request_with_id(data, method, None).await
    }

    pub async fn send_request_with_id<T, R>(
        &self,
        data: &T,
        method: &str,
        uuid: Option<String>,
    ) -> std::result::Result<R, RequestError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let signed = self.create_request_package(data, method, uuid)?;
        let raw = self.send(&signed).await?;
        let response = self.parse_and_validate::<R>(&raw, signed.uuid())?;
        Ok(response.into_data())
    }

    /// Signed success-arm response built with the client key.
    pub fn create_response_package<D: Serialize>(
        &self,
        method: &str,
        uuid: &str,
        data: D,
    ) -> Result<Envelope<D>> {
        self.inner
            .signer
            .sign_response(UnsignedEnvelope::new(method, Some(uuid.to_string()), data))
    }

    // ---- inbound ----

    /// Verify and dispatch one raw notification body.
    pub async fn handle_notification(&self, body: &str) -> Result<Acknowledgement> {
        self.inner
            .notifications
            .dispatch(self.inner.signer.as_ref(), body, self.ack_policy())
            .await
    }

    pub fn register(&self, method: impl Into<String>, handler: Arc<dyn NotificationHandler>) {
        self.inner.notifications.register(method, handler);
    }

    pub fn on_account(&self, handler: Arc<dyn NotificationHandler>) {
        self.register(notification::ACCOUNT, handler);
    }

    pub fn on_cancel(&self, handler: Arc<dyn NotificationHandler>) {
        self.register(notification::CANCEL, handler);
    }

    pub fn on_credit(&self, handler: Arc<dyn NotificationHandler>) {
        self.register(notification::CREDIT, handler);
    }

    pub fn on_debit(&self, handler: Arc<dyn NotificationHandler>) {
        self.register(notification::DEBIT, handler);
    }

    pub fn on_payout_confirmation(&self, handler: Arc<dyn NotificationHandler>) {
        self.register(notification::PAYOUT_CONFIRMATION, handler);
    }

    pub fn on_pending(&self, handler: Arc<dyn NotificationHandler>) {
        self.register(notification::PENDING, handler);
    }

    /// Fallback for methods without their own handlers.
    pub fn on_unknown(&self, handler: Arc<dyn NotificationHandler>) {
        self.inner.notifications.register_unknown(handler);
    }
}

/// A result carrying `rejected` is a decline unless its `result` flag is set.
fn assert_without_rejection(result: &WireEnvelope) -> Result<()> {
    let Some(data) = result.data.as_object() else {
        return Ok(());
    };
    let Some(rejected) = data.get("rejected") else {
        return Ok(());
    };
    if data.get("result").and_then(parse_flag).unwrap_or(false) {
        return Ok(());
    }

    let reason = rejected.as_str().map(str::to_string);
    tracing::warn!(
        method = %result.method,
        uuid = %result.uuid,
        reason = reason.as_deref().unwrap_or(""),
        "request rejected"
    );
    Err(PayRpcError::Rejection { reason })
}

/// Accepts `true`/`false`, `"1"`/`"0"`, `"true"`/`"false"` and `1`/`0`.
fn parse_flag(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    }
}
