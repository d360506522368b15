use std::time::Duration;

use payrpc_core::error::{is_blank, PayRpcError, Result};
use serde::Deserialize;

use crate::settings::{ClientSettings, SettingsBuilder, URL_PRODUCTION, URL_TEST};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayRpcConfig {
    pub version: u32,

    pub client: ClientSection,

    #[serde(default)]
    pub notifications: NotificationSection,
}

impl PayRpcConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PayRpcError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.client.validate()?;
        self.notifications.validate()?;

        Ok(())
    }

    /// Resolve the `client` section into settings, loading every key.
    pub fn client_settings(&self) -> Result<ClientSettings> {
        self.client.to_settings()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Test,
    Production,
}

impl Environment {
    pub fn url(self) -> &'static str {
        match self {
            Environment::Test => URL_TEST,
            Environment::Production => URL_PRODUCTION,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    /// Picks a well-known endpoint. Mutually exclusive with `url`.
    #[serde(default)]
    pub environment: Option<Environment>,

    #[serde(default)]
    pub url: Option<String>,

    pub username: String,
    pub password: String,

    pub keys: KeySection,

    #[serde(default = "default_include_message")]
    pub include_message: bool,

    #[serde(default)]
    pub include_exception_message: bool,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ClientSection {
    pub fn validate(&self) -> Result<()> {
        match (&self.environment, &self.url) {
            (Some(_), Some(_)) => {
                return Err(PayRpcError::Config(
                    "client.environment and client.url are mutually exclusive".into(),
                ))
            }
            (None, None) => {
                return Err(PayRpcError::Config(
                    "one of client.environment or client.url is required".into(),
                ))
            }
            (None, Some(url)) if is_blank(url) => {
                return Err(PayRpcError::Config("client.url must not be empty".into()))
            }
            _ => {}
        }
        if is_blank(&self.username) {
            return Err(PayRpcError::Config("client.username must not be empty".into()));
        }
        if !(1000..=300000).contains(&self.timeout_ms) {
            return Err(PayRpcError::Config(
                "client.timeout_ms must be between 1000 and 300000".into(),
            ));
        }

        self.keys.validate()?;

        Ok(())
    }

    pub fn endpoint(&self) -> &str {
        match (&self.url, self.environment) {
            (Some(url), _) => url.as_str(),
            (None, Some(env)) => env.url(),
            (None, None) => URL_TEST,
        }
    }

    pub fn to_settings(&self) -> Result<ClientSettings> {
        let mut builder = ClientSettings::builder(self.endpoint())
            .credentials(self.username.clone(), self.password.clone())
            .include_message_in_notification_response(self.include_message)
            .include_exception_message_in_notification_response(self.include_exception_message)
            .timeout(Duration::from_millis(self.timeout_ms));

        builder = self.keys.client_private_key.apply(
            builder,
            |b, pem| b.client_key_pem(pem),
            |b, path| b.client_key_file(path),
        );
        builder = self.keys.remote_public_key.apply(
            builder,
            |b, pem| b.remote_key_pem(pem),
            |b, path| b.remote_key_file(path),
        );
        if let Some(public) = &self.keys.client_public_key {
            builder = public.apply(
                builder,
                |b, pem| b.client_public_key_pem(pem),
                |b, path| b.client_public_key_file(path),
            );
        }

        builder.build()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeySection {
    pub client_private_key: KeyRef,

    #[serde(default)]
    pub client_public_key: Option<KeyRef>,

    pub remote_public_key: KeyRef,
}

impl KeySection {
    pub fn validate(&self) -> Result<()> {
        self.client_private_key.validate("client.keys.client_private_key")?;
        if let Some(k) = &self.client_public_key {
            k.validate("client.keys.client_public_key")?;
        }
        self.remote_public_key.validate("client.keys.remote_public_key")?;
        Ok(())
    }
}

/// A key given either inline (`pem`) or by location (`path`). Exactly one.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyRef {
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub pem: Option<String>,
}

impl KeyRef {
    pub fn validate(&self, field: &str) -> Result<()> {
        match (&self.path, &self.pem) {
            (Some(p), None) if !is_blank(p) => Ok(()),
            (None, Some(p)) if !is_blank(p) => Ok(()),
            _ => Err(PayRpcError::Config(format!(
                "{field} needs exactly one non-empty `path` or `pem`"
            ))),
        }
    }

    fn apply(
        &self,
        builder: SettingsBuilder,
        with_pem: fn(SettingsBuilder, String) -> SettingsBuilder,
        with_file: fn(SettingsBuilder, String) -> SettingsBuilder,
    ) -> SettingsBuilder {
        match (&self.pem, &self.path) {
            (Some(pem), _) => with_pem(builder, pem.clone()),
            (None, Some(path)) => with_file(builder, path.clone()),
            (None, None) => builder,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for NotificationSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
        }
    }
}

impl NotificationSection {
    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.listen) {
            return Err(PayRpcError::Config("notifications.listen must not be empty".into()));
        }
        if !self.path.starts_with('/') {
            return Err(PayRpcError::Config(
                "notifications.path must start with '/'".into(),
            ));
        }
        Ok(())
    }
}

fn default_include_message() -> bool {
    true
}
fn default_timeout_ms() -> u64 {
    30000
}
fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_path() -> String {
    "/notifications".into()
}
