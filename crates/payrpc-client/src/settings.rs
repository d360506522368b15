//! Client settings: endpoint, merchant credentials, and key material.
//!
//! Built through [`SettingsBuilder`], from environment variables, or from the
//! YAML config (see `config`). Keys are parsed once here and then shared
//! read-only by every call the client makes.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use payrpc_core::error::{is_blank, PayRpcError, Result};
use payrpc_core::protocol::{PrivateKey, PublicKey};

pub const URL_TEST: &str = "https://test.trustly.com/api/1";
pub const URL_PRODUCTION: &str = "https://api.trustly.com/1";

pub const ENV_USERNAME: &str = "CLIENT_USERNAME";
pub const ENV_PASSWORD: &str = "CLIENT_PASSWORD";
pub const ENV_CERT_PRIVATE: &str = "CLIENT_CERT_PRIVATE";
pub const ENV_CERT_PUBLIC: &str = "CLIENT_CERT_PUBLIC";
pub const ENV_REMOTE_CERT_PUBLIC: &str = "REMOTE_CERT_PUBLIC";

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

#[derive(Clone)]
pub struct ClientSettings {
    pub url: String,
    pub username: String,
    pub password: String,
    pub client_private_key: PrivateKey,
    /// Must be the public half of `client_private_key`.
    pub client_public_key: Option<PublicKey>,
    pub remote_public_key: PublicKey,
    /// Put the handler's message into the acknowledgement data.
    pub include_message_in_notification_response: bool,
    /// Put a failing handler's error text into the acknowledgement message.
    pub include_exception_message_in_notification_response: bool,
    /// Whole-request timeout for the HTTP transport.
    pub timeout: Duration,
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .field(
                "include_message_in_notification_response",
                &self.include_message_in_notification_response,
            )
            .field(
                "include_exception_message_in_notification_response",
                &self.include_exception_message_in_notification_response,
            )
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ClientSettings {
    pub fn builder(url: impl Into<String>) -> SettingsBuilder {
        SettingsBuilder::new(url.into())
    }

    pub fn for_test() -> SettingsBuilder {
        Self::builder(URL_TEST)
    }

    pub fn for_production() -> SettingsBuilder {
        Self::builder(URL_PRODUCTION)
    }

    /// Read credentials and PEM contents from the process environment.
    pub fn from_env(url: impl Into<String>) -> Result<Self> {
        Self::from_lookup(url, |name| std::env::var(name).ok())
    }

    /// Like [`ClientSettings::from_env`] with a custom variable lookup.
    pub fn from_lookup<F>(url: impl Into<String>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !is_blank(v))
                .ok_or_else(|| PayRpcError::Config(format!("environment variable {name} is not set")))
        };

        let mut builder = Self::builder(url)
            .credentials(required(ENV_USERNAME)?, required(ENV_PASSWORD)?)
            .client_key_pem(required(ENV_CERT_PRIVATE)?)
            .remote_key_pem(required(ENV_REMOTE_CERT_PUBLIC)?);
        if let Some(public) = lookup(ENV_CERT_PUBLIC).filter(|v| !is_blank(v)) {
            builder = builder.client_public_key_pem(public);
        }
        builder.build()
    }
}

#[derive(Clone)]
enum KeySource {
    Pem(String),
    File(PathBuf),
}

impl KeySource {
    fn read(&self) -> Result<String> {
        match self {
            KeySource::Pem(pem) => Ok(pem.clone()),
            KeySource::File(path) => fs::read_to_string(path)
                .map_err(|e| PayRpcError::Key(format!("read key {} failed: {e}", path.display()))),
        }
    }
}

#[derive(Clone)]
pub struct SettingsBuilder {
    url: String,
    username: Option<String>,
    password: Option<String>,
    client_private: Option<KeySource>,
    client_public: Option<KeySource>,
    remote_public: Option<KeySource>,
    include_message: bool,
    include_exception_message: bool,
    timeout: Duration,
}

impl SettingsBuilder {
    fn new(url: String) -> Self {
        Self {
            url,
            username: None,
            password: None,
            client_private: None,
            client_public: None,
            remote_public: None,
            include_message: true,
            include_exception_message: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn client_key_pem(mut self, pem: impl Into<String>) -> Self {
        self.client_private = Some(KeySource::Pem(pem.into()));
        self
    }

    pub fn client_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.client_private = Some(KeySource::File(path.into()));
        self
    }

    pub fn client_public_key_pem(mut self, pem: impl Into<String>) -> Self {
        self.client_public = Some(KeySource::Pem(pem.into()));
        self
    }

    pub fn client_public_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.client_public = Some(KeySource::File(path.into()));
        self
    }

    pub fn remote_key_pem(mut self, pem: impl Into<String>) -> Self {
        self.remote_public = Some(KeySource::Pem(pem.into()));
        self
    }

    pub fn remote_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.remote_public = Some(KeySource::File(path.into()));
        self
    }

    pub fn include_message_in_notification_response(mut self, on: bool) -> Self {
        self.include_message = on;
        self
    }

    pub fn include_exception_message_in_notification_response(mut self, on: bool) -> Self {
        self.include_exception_message = on;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ClientSettings> {
        if is_blank(&self.url) {
            return Err(PayRpcError::Config("the url must not be empty".into()));
        }
        let username = self
            .username
            .filter(|u| !is_blank(u))
            .ok_or_else(|| PayRpcError::Config("username is required".into()))?;
        let password = self
            .password
            .filter(|p| !is_blank(p))
            .ok_or_else(|| PayRpcError::Config("password is required".into()))?;

        let client_private_key = match &self.client_private {
            Some(src) => PrivateKey::from_pem(&src.read()?)?,
            None => return Err(PayRpcError::Config("client private key is required".into())),
        };
        let client_public_key = match &self.client_public {
            Some(src) => Some(PublicKey::from_pem(&src.read()?)?),
            None => None,
        };
        if let Some(public) = &client_public_key {
            if *public != client_private_key.public_key() {
                return Err(PayRpcError::Config(
                    "client public key does not match the client private key".into(),
                ));
            }
        }
        let remote_public_key = match &self.remote_public {
            Some(src) => PublicKey::from_pem(&src.read()?)?,
            None => return Err(PayRpcError::Config("remote public key is required".into())),
        };

        Ok(ClientSettings {
            url: self.url,
            username,
            password,
            client_private_key,
            client_public_key,
            remote_public_key,
            include_message_in_notification_response: self.include_message,
            include_exception_message_in_notification_response: self.include_exception_message,
            timeout: self.timeout,
        })
    }
}
