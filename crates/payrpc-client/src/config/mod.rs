//! Client config loader (strict parsing).

pub mod schema;

use std::fs;

use payrpc_core::error::{PayRpcError, Result};

pub use schema::{
    ClientSection, Environment, KeyRef, KeySection, NotificationSection, PayRpcConfig,
};

pub fn load_from_file(path: &str) -> Result<PayRpcConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PayRpcError::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<PayRpcConfig> {
    let cfg: PayRpcConfig = serde_yaml::from_str(s)
        .map_err(|e| PayRpcError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
