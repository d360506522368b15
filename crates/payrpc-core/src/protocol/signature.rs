//! Signature engine.
//!
//! Plaintext is `method ++ uuid ++ canonical(data)` with no separators, signed
//! with RSA PKCS#1 v1.5 over SHA-1 and carried as standard base64. The
//! composition and the algorithm are fixed by the counterparty; both sides
//! must produce identical bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rsa::pkcs1v15;
use rsa::signature::{SignatureEncoding, Signer as _, Verifier as _};
use serde::Serialize;
use serde_json::Value;

use crate::error::{is_blank, PayRpcError, RemoteFailure, Result};
use crate::protocol::canonical::serialize_node;
use crate::protocol::envelope::{
    Envelope, ErrorReply, UnsignedEnvelope, UnsignedErrorReply, WireEnvelope, WireNotification,
};
use crate::protocol::keys::{PrivateKey, PublicKey};

/// The exact byte string that is signed.
pub fn plaintext(serialized_data: &str, method: &str, uuid: &str) -> String {
    let mut s = String::with_capacity(method.len() + uuid.len() + serialized_data.len());
    s.push_str(method);
    s.push_str(uuid);
    s.push_str(serialized_data);
    s
}

/// Sign `data` for `method`/`uuid`, returning base64.
pub fn sign(method: &str, uuid: &str, data: &Value, key: &PrivateKey) -> Result<String> {
    sign_serialized(method, uuid, &serialize_node(data), key)
}

/// Sign data that is already in canonical form.
pub fn sign_serialized(
    method: &str,
    uuid: &str,
    serialized_data: &str,
    key: &PrivateKey,
) -> Result<String> {
    let text = plaintext(serialized_data, method, uuid);
    let sig = key
        .signing_key()
        .try_sign(text.as_bytes())
        .map_err(|e| PayRpcError::Internal(format!("signing failed: {e}")))?;
    Ok(STANDARD.encode(sig.to_bytes()))
}

/// Check a base64 signature over a value tree.
pub fn verify(
    method: &str,
    uuid: &str,
    data: &Value,
    signature: &str,
    key: &PublicKey,
) -> Result<()> {
    verify_serialized(method, uuid, &serialize_node(data), signature, key)
}

/// Check a base64 signature over canonical text. A blank signature is
/// rejected before any cryptographic work happens.
pub fn verify_serialized(
    method: &str,
    uuid: &str,
    serialized_data: &str,
    signature: &str,
    key: &PublicKey,
) -> Result<()> {
    if is_blank(signature) {
        return Err(PayRpcError::SignatureMissing);
    }

    let raw = STANDARD
        .decode(signature.trim())
        .map_err(|e| PayRpcError::Signature(format!("signature is not valid base64: {e}")))?;
    let sig = pkcs1v15::Signature::try_from(raw.as_slice())
        .map_err(|e| PayRpcError::Signature(format!("malformed signature: {e}")))?;

    let text = plaintext(serialized_data, method, uuid);
    key.verifying_key()
        .verify(text.as_bytes(), &sig)
        .map_err(|_| PayRpcError::Signature(format!("could not verify the message (method={method})")))
}

/// Pluggable signer seam: signs with the local key, verifies with the
/// counterparty key.
pub trait Signer: Send + Sync {
    fn sign_serialized(&self, method: &str, uuid: &str, serialized_data: &str) -> Result<String>;

    fn verify_serialized(
        &self,
        method: &str,
        uuid: &str,
        serialized_data: &str,
        signature: &str,
    ) -> Result<()>;

    fn sign(&self, method: &str, uuid: &str, data: &Value) -> Result<String> {
        self.sign_serialized(method, uuid, &serialize_node(data))
    }

    fn verify(&self, method: &str, uuid: &str, data: &Value, signature: &str) -> Result<()> {
        self.verify_serialized(method, uuid, &serialize_node(data), signature)
    }
}

/// Default signer: local RSA private key + counterparty RSA public key.
#[derive(Debug, Clone)]
pub struct RsaSigner {
    local: PrivateKey,
    remote: PublicKey,
}

impl RsaSigner {
    pub fn new(local: PrivateKey, remote: PublicKey) -> Self {
        Self { local, remote }
    }

    pub fn from_pem(local_private_pem: &str, remote_public_pem: &str) -> Result<Self> {
        Ok(Self::new(
            PrivateKey::from_pem(local_private_pem)?,
            PublicKey::from_pem(remote_public_pem)?,
        ))
    }
}

impl Signer for RsaSigner {
    fn sign_serialized(&self, method: &str, uuid: &str, serialized_data: &str) -> Result<String> {
        sign_serialized(method, uuid, serialized_data, &self.local)
    }

    fn verify_serialized(
        &self,
        method: &str,
        uuid: &str,
        serialized_data: &str,
        signature: &str,
    ) -> Result<()> {
        verify_serialized(method, uuid, serialized_data, signature, &self.remote)
    }
}

/// Envelope-level operations, available on every [`Signer`].
///
/// Verification of inbound traffic always runs on the wire text. The typed
/// path exists only as [`SignerExt::verify_reconstructed`] and must be chosen
/// explicitly.
pub trait SignerExt: Signer {
    fn sign_request<D: Serialize>(&self, unsigned: UnsignedEnvelope<D>) -> Result<Envelope<D>> {
        let signature = sign_unsigned(self, &unsigned)?;
        Ok(unsigned.into_signed(signature))
    }

    fn sign_response<D: Serialize>(&self, unsigned: UnsignedEnvelope<D>) -> Result<Envelope<D>> {
        let signature = sign_unsigned(self, &unsigned)?;
        Ok(unsigned.into_signed(signature))
    }

    /// Signs the nested `error.error` detail of an error arm.
    fn sign_error<D: Serialize>(&self, unsigned: UnsignedErrorReply<D>) -> Result<ErrorReply<D>> {
        let signature = sign_unsigned(self, &unsigned.detail)?;
        Ok(ErrorReply {
            code: unsigned.code,
            message: unsigned.message,
            name: unsigned.name,
            detail: unsigned.detail.into_signed(signature),
        })
    }

    fn verify_request(&self, request: &WireEnvelope) -> Result<()> {
        verify_wire(self, request)
    }

    fn verify_notification(&self, notification: &WireNotification) -> Result<()> {
        verify_wire(self, &notification.envelope)
    }

    fn verify_response(&self, response: &WireEnvelope) -> Result<()> {
        verify_wire(self, response)
    }

    /// Verifies the signed detail of an error arm; an unsigned error arm fails.
    fn verify_error(&self, failure: &RemoteFailure) -> Result<()> {
        let detail = failure
            .detail_envelope()
            .ok_or_else(|| PayRpcError::Validation("error arm carries no signed detail".into()))??;
        verify_wire(self, &detail)
    }

    /// Verifies against a typed value instead of the wire node. Only correct
    /// when the typed value reproduces the wire data exactly (nulls, absent
    /// keys and unknown fields included).
    fn verify_reconstructed<D: Serialize>(&self, envelope: &Envelope<D>) -> Result<()> {
        let node = serde_json::to_value(envelope.data())?;
        self.verify(envelope.method(), envelope.uuid(), &node, envelope.signature())
    }
}

impl<S: Signer + ?Sized> SignerExt for S {}

fn sign_unsigned<S, D>(signer: &S, unsigned: &UnsignedEnvelope<D>) -> Result<String>
where
    S: Signer + ?Sized,
    D: Serialize,
{
    let node = serde_json::to_value(&unsigned.data)?;
    signer.sign(&unsigned.method, &unsigned.uuid, &node)
}

fn verify_wire<S: Signer + ?Sized>(signer: &S, wire: &WireEnvelope) -> Result<()> {
    signer.verify_serialized(&wire.method, &wire.uuid, wire.canonical_data(), &wire.signature)
}
