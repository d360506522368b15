//! Protocol modules.
//!
//! - `canonical`: deterministic text form of a data tree (the signed input).
//! - `signature`: plaintext composition, RSA/SHA-1 signing and verification.
//! - `keys`: PEM key loading.
//! - `envelope`: outbound typed envelopes and inbound wire envelopes.
//!
//! All parsers are panic-free: malformed input is reported as `PayRpcError`.

pub mod canonical;
pub mod envelope;
pub mod keys;
pub mod signature;

pub use envelope::{
    new_request_id, Envelope, ErrorReply, UnsignedEnvelope, UnsignedErrorReply, WireEnvelope,
    WireNotification, WireResponse, VERSION,
};
pub use keys::{PrivateKey, PublicKey};
pub use signature::{RsaSigner, Signer, SignerExt};
