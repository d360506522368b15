//! Envelope model (JSON-RPC 1.1 dialect of the payment API).
//!
//! Outbound envelopes are typed; inbound ones are kept as wire nodes
//! ([`WireEnvelope`]) so signatures are checked against exactly what arrived.
//! Typed reconstruction happens only after verification.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

use super::canonical::serialize_raw;
use crate::error::{is_blank, PayRpcError, RemoteFailure, Result};

/// Protocol version sent in every envelope.
pub const VERSION: &str = "1.1";

/// Fresh correlation id (random v4 uuid, hyphenated).
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Envelope before signing.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedEnvelope<D> {
    pub method: String,
    pub uuid: String,
    pub data: D,
}

impl<D> UnsignedEnvelope<D> {
    /// Build an unsigned envelope, generating an id when none (or a blank one) is given.
    pub fn new(method: impl Into<String>, uuid: Option<String>, data: D) -> Self {
        Self {
            method: method.into(),
            uuid: uuid.filter(|u| !is_blank(u)).unwrap_or_else(new_request_id),
            data,
        }
    }

    /// Attach a signature. Method, id and data are moved over untouched.
    pub fn into_signed(self, signature: String) -> Envelope<D> {
        Envelope {
            method: self.method,
            uuid: self.uuid,
            data: self.data,
            signature,
        }
    }
}

/// Signed envelope. Immutable: only accessors are exposed.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<D> {
    method: String,
    uuid: String,
    data: D,
    signature: String,
}

impl<D> Envelope<D> {
    pub fn method(&self) -> &str {
        &self.method
    }
    pub fn uuid(&self) -> &str {
        &self.uuid
    }
    pub fn data(&self) -> &D {
        &self.data
    }
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn into_data(self) -> D {
        self.data
    }
}

impl<D: Serialize> Envelope<D> {
    /// Outbound request: `{method, version, params: {Signature, UUID, Data}}`.
    pub fn to_request_json(&self) -> Result<String> {
        let body = json!({
            "method": self.method,
            "version": VERSION,
            "params": {
                "Signature": self.signature,
                "UUID": self.uuid,
                "Data": serde_json::to_value(&self.data)?,
            }
        });
        Ok(body.to_string())
    }

    /// Success response: `{version, result: {method, uuid, data, signature}}`.
    pub fn to_response_json(&self) -> Result<String> {
        let body = json!({
            "version": VERSION,
            "result": {
                "method": self.method,
                "uuid": self.uuid,
                "data": serde_json::to_value(&self.data)?,
                "signature": self.signature,
            }
        });
        Ok(body.to_string())
    }

    /// Server-initiated push: `{method, version, params: {uuid, data, signature}}`.
    pub fn to_notification_json(&self) -> Result<String> {
        let body = json!({
            "method": self.method,
            "version": VERSION,
            "params": {
                "uuid": self.uuid,
                "data": serde_json::to_value(&self.data)?,
                "signature": self.signature,
            }
        });
        Ok(body.to_string())
    }
}

/// Error arm before its nested detail is signed.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedErrorReply<D> {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub name: Option<String>,
    pub detail: UnsignedEnvelope<D>,
}

/// Error arm with a signed `error.error` detail.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReply<D> {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub name: Option<String>,
    pub detail: Envelope<D>,
}

impl<D: Serialize> ErrorReply<D> {
    /// `{version, error: {code, message, name, error: {method, uuid, data, signature}}}`.
    pub fn to_json(&self) -> Result<String> {
        let body = json!({
            "version": VERSION,
            "error": {
                "code": self.code,
                "message": self.message,
                "name": self.name,
                "error": {
                    "method": self.detail.method(),
                    "uuid": self.detail.uuid(),
                    "data": serde_json::to_value(self.detail.data())?,
                    "signature": self.detail.signature(),
                }
            }
        });
        Ok(body.to_string())
    }
}

/// Inbound envelope exactly as received.
#[derive(Debug, Clone, PartialEq)]
pub struct WireEnvelope {
    pub method: String,
    pub uuid: String,
    /// Empty when the sender did not include one; verification fails closed.
    pub signature: String,
    /// The `data` node as parsed, never re-built from a typed value.
    pub data: Value,
    /// Canonical serialization of `data`, taken from its wire text.
    canonical: String,
}

type RawFields<'a> = HashMap<String, &'a RawValue>;

impl WireEnvelope {
    /// Read `{uuid, data, signature}` from a params/result node. `method` comes
    /// either from the node itself or from the enclosing request.
    fn from_node(node: &Value, raw: &RawValue, method: Option<&str>) -> Result<Self> {
        let obj = node
            .as_object()
            .ok_or_else(|| PayRpcError::Validation("envelope body must be an object".into()))?;

        let method = match method {
            Some(m) => m.to_string(),
            None => str_field(obj, &["method"])
                .ok_or_else(|| PayRpcError::Validation("missing method".into()))?,
        };
        let uuid = str_field(obj, &["uuid", "UUID"])
            .ok_or_else(|| PayRpcError::Validation("missing uuid".into()))?;
        let signature = str_field(obj, &["signature", "Signature"]).unwrap_or_default();
        let data = field(obj, &["data", "Data"])
            .filter(|d| !d.is_null())
            .cloned()
            .ok_or_else(|| PayRpcError::Validation("missing data".into()))?;

        let raw_fields: RawFields<'_> = serde_json::from_str(raw.get())?;
        let raw_data = raw_field(&raw_fields, &["data", "Data"])
            .ok_or_else(|| PayRpcError::Validation("missing data".into()))?;
        let canonical = serialize_raw(raw_data)?;

        Ok(Self {
            method,
            uuid,
            signature,
            data,
            canonical,
        })
    }

    /// What the signature covers on the data side, before method and uuid.
    pub fn canonical_data(&self) -> &str {
        &self.canonical
    }

    /// Typed reconstruction of the data node.
    pub fn decode<D: DeserializeOwned>(&self) -> Result<Envelope<D>> {
        let data: D = serde_json::from_value(self.data.clone())
            .map_err(|e| PayRpcError::Validation(format!("unexpected data shape: {e}")))?;
        Ok(Envelope {
            method: self.method.clone(),
            uuid: self.uuid.clone(),
            data,
            signature: self.signature.clone(),
        })
    }
}

/// Parsed response: exactly one arm.
#[derive(Debug, Clone, PartialEq)]
pub enum WireResponse {
    Result(WireEnvelope),
    Error(RemoteFailure),
}

impl WireResponse {
    /// Parse a raw response body.
    ///
    /// Both arms present, or neither, is a protocol violation regardless of
    /// what either arm contains.
    pub fn parse(body: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(body)?;
        let obj = root
            .as_object()
            .ok_or_else(|| PayRpcError::Validation("response must be a json object".into()))?;
        let raw_root: RawFields<'_> = serde_json::from_str(body)?;

        let result = obj.get("result").filter(|v| !v.is_null());
        let error = obj.get("error").filter(|v| !v.is_null());

        match (result, error) {
            (Some(_), Some(_)) => Err(PayRpcError::Validation(
                "response carries both a result and an error".into(),
            )),
            (None, None) => Err(PayRpcError::Validation(
                "response carries neither a result nor an error".into(),
            )),
            (Some(result), None) => {
                let raw = raw_arm(&raw_root, "result")?;
                Ok(WireResponse::Result(WireEnvelope::from_node(result, raw, None)?))
            }
            (None, Some(error)) => {
                let raw = raw_arm(&raw_root, "error")?;
                Ok(WireResponse::Error(remote_failure(error, raw)?))
            }
        }
    }
}

/// Inbound notification (or any inbound request).
#[derive(Debug, Clone, PartialEq)]
pub struct WireNotification {
    pub version: Option<String>,
    pub envelope: WireEnvelope,
}

impl WireNotification {
    pub fn parse(body: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(body)?;
        let obj = root
            .as_object()
            .ok_or_else(|| PayRpcError::Validation("notification must be a json object".into()))?;
        let raw_root: RawFields<'_> = serde_json::from_str(body)?;

        let method = str_field(obj, &["method"])
            .ok_or_else(|| PayRpcError::Validation("notification is missing its method".into()))?;
        let params = obj
            .get("params")
            .ok_or_else(|| PayRpcError::Validation("notification is missing its params".into()))?;

        // version is sent as "1.1" but some senders use a bare number
        let version = obj.get("version").and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Ok(Self {
            version,
            envelope: WireEnvelope::from_node(params, raw_arm(&raw_root, "params")?, Some(&method))?,
        })
    }

    pub fn method(&self) -> &str {
        &self.envelope.method
    }

    pub fn uuid(&self) -> &str {
        &self.envelope.uuid
    }
}

impl RemoteFailure {
    /// The nested `error.error` envelope, when the counterparty signed one.
    pub fn detail_envelope(&self) -> Option<Result<WireEnvelope>> {
        let (detail, raw) = (self.detail.as_ref()?, self.detail_raw.as_deref()?);
        Some(
            serde_json::from_str::<&RawValue>(raw)
                .map_err(PayRpcError::from)
                .and_then(|raw| WireEnvelope::from_node(detail, raw, None)),
        )
    }
}

fn remote_failure(node: &Value, raw: &RawValue) -> Result<RemoteFailure> {
    let obj = node
        .as_object()
        .ok_or_else(|| PayRpcError::Validation("error arm must be an object".into()))?;

    let code = obj.get("code").and_then(|c| match c {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });

    let detail = obj.get("error").filter(|v| !v.is_null()).cloned();
    let detail_raw = match detail {
        Some(_) => {
            let raw_fields: RawFields<'_> = serde_json::from_str(raw.get())?;
            raw_arm(&raw_fields, "error").map(|r| r.get().to_string()).ok()
        }
        None => None,
    };

    Ok(RemoteFailure {
        code,
        message: str_field(obj, &["message"]),
        name: str_field(obj, &["name"]),
        detail,
        detail_raw,
    })
}

fn raw_field<'a>(fields: &RawFields<'a>, names: &[&str]) -> Option<&'a RawValue> {
    names.iter().find_map(|n| fields.get(*n).copied())
}

fn raw_arm<'a>(fields: &RawFields<'a>, name: &str) -> Result<&'a RawValue> {
    raw_field(fields, &[name])
        .ok_or_else(|| PayRpcError::Validation(format!("missing {name}")))
}

fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|n| obj.get(*n))
}

fn str_field(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    field(obj, names).and_then(Value::as_str).map(str::to_string)
}
