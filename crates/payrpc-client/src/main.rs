//! payrpc-notify
//!
//! Serves the notification endpoint for one configured client.
//! - Config: `PAYRPC_CONFIG` (default `payrpc.yaml`)
//! - Route: `notifications.path` on `notifications.listen`
//! - Unhandled methods are logged and acknowledged OK

use std::net::SocketAddr;

use payrpc_client::dispatch::handler_fn;
use payrpc_client::endpoint::{notification_router, NotificationEndpoint};
use payrpc_client::{config, ApiClient};
use payrpc_core::error::{PayRpcError, Result};
use tracing_subscriber::{fmt, EnvFilter};

const CONFIG_ENV: &str = "PAYRPC_CONFIG";
const DEFAULT_CONFIG: &str = "payrpc.yaml";

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "payrpc-notify stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg.notifications.listen.parse().map_err(|e| {
        PayRpcError::Config(format!("notifications.listen must be a valid SocketAddr: {e}"))
    })?;

    let client = ApiClient::new(cfg.client_settings()?)?;
    client.on_unknown(handler_fn(|args| {
        tracing::info!(
            method = %args.method(),
            uuid = %args.uuid(),
            "notification received"
        );
        args.respond_with_ok();
        Ok(())
    }));

    let endpoint = NotificationEndpoint::new(vec![client])?;
    let app = notification_router(endpoint, &cfg.notifications.path);

    tracing::info!(%listen, path = %cfg.notifications.path, "payrpc-notify starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| PayRpcError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| PayRpcError::Internal(format!("server failed: {e}")))
}
