//! RSA key material.
//!
//! Private keys are accepted as PKCS#8 (`BEGIN PRIVATE KEY`) or PKCS#1
//! (`BEGIN RSA PRIVATE KEY`) PEM, public keys as SPKI (`BEGIN PUBLIC KEY`) or
//! PKCS#1 (`BEGIN RSA PUBLIC KEY`) PEM. Keys are read-only once built and can
//! be shared between concurrent calls.

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs1v15::{SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;

use crate::error::{PayRpcError, Result};

/// Local signing key (RSA, PKCS#1 v1.5 over SHA-1).
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey<Sha1>,
}

impl PrivateKey {
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pem = pem.trim();
        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| {
                tracing::debug!("private key is not PKCS#8, trying PKCS#1");
                RsaPrivateKey::from_pkcs1_pem(pem)
            })
            .map_err(|e| PayRpcError::Key(format!("unreadable private key: {e}")))?;
        Ok(Self::from(key))
    }

    /// The matching public half.
    pub fn public_key(&self) -> PublicKey {
        let public = RsaPublicKey::from(self.inner.as_ref());
        PublicKey::from(public)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey<Sha1> {
        &self.inner
    }
}

impl From<RsaPrivateKey> for PrivateKey {
    fn from(key: RsaPrivateKey) -> Self {
        Self {
            inner: SigningKey::<Sha1>::new(key),
        }
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// Counterparty verification key.
#[derive(Clone)]
pub struct PublicKey {
    inner: VerifyingKey<Sha1>,
}

impl PublicKey {
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pem = pem.trim();
        let key = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| {
                tracing::debug!("public key is not SPKI, trying PKCS#1");
                RsaPublicKey::from_pkcs1_pem(pem)
            })
            .map_err(|e| PayRpcError::Key(format!("unreadable public key: {e}")))?;
        Ok(Self::from(key))
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey<Sha1> {
        &self.inner
    }
}

impl From<RsaPublicKey> for PublicKey {
    fn from(key: RsaPublicKey) -> Self {
        Self {
            inner: VerifyingKey::<Sha1>::new(key),
        }
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        let (a, b): (&RsaPublicKey, &RsaPublicKey) = (self.inner.as_ref(), other.inner.as_ref());
        a == b
    }
}

impl Eq for PublicKey {}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PublicKey(..)")
    }
}
