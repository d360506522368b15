use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use dashmap::DashMap;
use payrpc_core::error::{PayRpcError, Result};
use payrpc_core::protocol::{Signer, SignerExt, WireEnvelope, WireNotification};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ack::{AckOutcome, AckPolicy, AckStatus, Acknowledgement};

/// Application callback for a verified notification.
///
/// Handlers answer through [`NotificationArgs::respond_with_ok`] or
/// [`NotificationArgs::respond_with_failed`]. Returning `Err` stops the
/// remaining handlers and records FAILED.
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    async fn on_notification(&self, args: &NotificationArgs) -> Result<()>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F> NotificationHandler for FnHandler<F>
where
    F: Fn(&NotificationArgs) -> Result<()> + Send + Sync,
{
    async fn on_notification(&self, args: &NotificationArgs) -> Result<()> {
        (self.0)(args)
    }
}

/// Wrap a synchronous closure as a handler.
pub fn handler_fn<F>(f: F) -> Arc<dyn NotificationHandler>
where
    F: Fn(&NotificationArgs) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// A verified notification plus the slot its acknowledgement goes into.
#[derive(Debug)]
pub struct NotificationArgs {
    envelope: WireEnvelope,
    outcome: OnceLock<AckOutcome>,
}

impl NotificationArgs {
    fn new(envelope: WireEnvelope) -> Self {
        Self {
            envelope,
            outcome: OnceLock::new(),
        }
    }

    pub fn method(&self) -> &str {
        &self.envelope.method
    }

    pub fn uuid(&self) -> &str {
        &self.envelope.uuid
    }

    /// The data node exactly as received.
    pub fn data(&self) -> &Value {
        &self.envelope.data
    }

    /// Typed view of the data node.
    pub fn decode<D: DeserializeOwned>(&self) -> Result<D> {
        Ok(self.envelope.decode::<D>()?.into_data())
    }

    pub fn respond_with_ok(&self) -> bool {
        self.record(AckStatus::Ok, None)
    }

    pub fn respond_with_ok_message(&self, message: impl Into<String>) -> bool {
        self.record(AckStatus::Ok, Some(message.into()))
    }

    pub fn respond_with_failed(&self, message: impl Into<String>) -> bool {
        self.record(AckStatus::Failed, Some(message.into()))
    }

    pub fn is_acknowledged(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// First outcome wins; returns whether this one was kept.
    fn record(&self, status: AckStatus, message: Option<String>) -> bool {
        let kept = self.outcome.set(AckOutcome { status, message }).is_ok();
        if !kept {
            tracing::debug!(
                method = %self.envelope.method,
                uuid = %self.envelope.uuid,
                status = status.as_str(),
                "notification already acknowledged, outcome ignored"
            );
        }
        kept
    }

    fn into_outcome(self) -> Option<AckOutcome> {
        self.outcome.into_inner()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Route {
    Method(String),
    Unknown,
}

/// Per-method ordered handler lists with an "unknown" fallback list.
#[derive(Default)]
pub struct NotificationTable {
    routes: DashMap<Route, Vec<Arc<dyn NotificationHandler>>>,
}

impl NotificationTable {
    pub fn new() -> Self {
        Self {
            routes: DashMap::new(),
        }
    }

    /// Append a handler for `method`. Every handler of a method runs, in
    /// registration order.
    pub fn register(&self, method: impl Into<String>, handler: Arc<dyn NotificationHandler>) {
        self.routes
            .entry(Route::Method(method.into()))
            .or_default()
            .push(handler);
    }

    /// Append a handler for methods nobody registered for.
    pub fn register_unknown(&self, handler: Arc<dyn NotificationHandler>) {
        self.routes.entry(Route::Unknown).or_default().push(handler);
    }

    pub fn registered_methods(&self) -> Vec<String> {
        self.routes
            .iter()
            .filter_map(|e| match e.key() {
                Route::Method(m) => Some(m.clone()),
                Route::Unknown => None,
            })
            .collect()
    }

    /// Snapshot of the handlers that would run for `method`. The lock is
    /// released before any handler executes.
    fn handlers_for(&self, method: &str) -> Option<(Vec<Arc<dyn NotificationHandler>>, bool)> {
        if let Some(list) = self
            .routes
            .get(&Route::Method(method.to_string()))
            .filter(|l| !l.is_empty())
        {
            return Some((list.value().clone(), false));
        }
        self.routes
            .get(&Route::Unknown)
            .filter(|l| !l.is_empty())
            .map(|l| (l.value().clone(), true))
    }

    /// Parse, verify, run handlers, and sign the acknowledgement.
    ///
    /// Verification happens before any handler lookup, so a forged
    /// notification never reaches application code.
    pub async fn dispatch<S: Signer + ?Sized>(
        &self,
        signer: &S,
        body: &str,
        policy: AckPolicy,
    ) -> Result<Acknowledgement> {
        let notification = WireNotification::parse(body)?;
        if let Err(e) = signer.verify_notification(&notification) {
            tracing::warn!(
                method = %notification.method(),
                uuid = %notification.uuid(),
                error = %e,
                "notification signature rejected, is the remote public key the one for this environment?"
            );
            return Err(e);
        }
        tracing::info!(
            method = %notification.method(),
            uuid = %notification.uuid(),
            "notification verified"
        );

        let method = notification.method().to_string();
        let uuid = notification.uuid().to_string();

        let (handlers, fallback) = self
            .handlers_for(&method)
            .ok_or_else(|| PayRpcError::NoListener(method.clone()))?;
        if fallback {
            tracing::warn!(method = %method, "no listener for notification, using the unknown fallback");
        }

        let args = NotificationArgs::new(notification.envelope);
        for handler in handlers {
            if let Err(e) = handler.on_notification(&args).await {
                tracing::warn!(method = %method, uuid = %uuid, error = %e, "notification handler failed");
                let message = policy.include_exception_message.then(|| e.to_string());
                args.record(AckStatus::Failed, message);
                break;
            }
        }

        let outcome = args
            .into_outcome()
            .ok_or_else(|| PayRpcError::Unacknowledged(method.clone()))?;
        tracing::info!(
            method = %method,
            uuid = %uuid,
            status = outcome.status.as_str(),
            "notification dispatched"
        );

        Acknowledgement::sign(signer, &method, &uuid, outcome, policy)
    }
}
