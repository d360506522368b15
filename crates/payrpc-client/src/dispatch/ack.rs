use payrpc_core::error::{is_blank, Result};
use payrpc_core::protocol::{Envelope, Signer, SignerExt, UnsignedEnvelope};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AckStatus {
    Ok,
    Failed,
}

impl AckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AckStatus::Ok => "OK",
            AckStatus::Failed => "FAILED",
        }
    }

    /// HTTP status written with the acknowledgement.
    pub fn http_status(self) -> u16 {
        match self {
            AckStatus::Ok => 200,
            AckStatus::Failed => 500,
        }
    }
}

/// Data of an acknowledgement envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckData {
    pub status: AckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Which parts of a handler's outcome end up on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckPolicy {
    pub include_message: bool,
    pub include_exception_message: bool,
}

impl Default for AckPolicy {
    fn default() -> Self {
        Self {
            include_message: true,
            include_exception_message: false,
        }
    }
}

/// What a handler asked to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AckOutcome {
    pub status: AckStatus,
    pub message: Option<String>,
}

/// Signed acknowledgement for one notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Acknowledgement {
    envelope: Envelope<AckData>,
}

impl Acknowledgement {
    /// Build and sign. The message is settled before signing so the
    /// signature covers exactly what is sent.
    pub(crate) fn sign<S: Signer + ?Sized>(
        signer: &S,
        method: &str,
        uuid: &str,
        outcome: AckOutcome,
        policy: AckPolicy,
    ) -> Result<Self> {
        let message = outcome
            .message
            .filter(|m| policy.include_message && !is_blank(m));
        let unsigned = UnsignedEnvelope::new(
            method,
            Some(uuid.to_string()),
            AckData {
                status: outcome.status,
                message,
            },
        );
        Ok(Self {
            envelope: signer.sign_response(unsigned)?,
        })
    }

    pub fn status(&self) -> AckStatus {
        self.envelope.data().status
    }

    pub fn http_status(&self) -> u16 {
        self.status().http_status()
    }

    pub fn envelope(&self) -> &Envelope<AckData> {
        &self.envelope
    }

    /// `{version, result: {method, uuid, data: {status, message?}, signature}}`.
    pub fn to_json(&self) -> Result<String> {
        self.envelope.to_response_json()
    }
}
