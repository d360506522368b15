//! payrpc client library entry.
//!
//! This crate wires the signature engine, the transport, and the notification
//! dispatch table into an API client, and exposes an axum endpoint that feeds
//! inbound notifications to an explicit set of clients. It is consumed by the
//! `payrpc-notify` binary (`main.rs`) and by integration tests.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod methods;
pub mod settings;
pub mod transport;

pub use client::ApiClient;
pub use dispatch::{
    handler_fn, AckStatus, Acknowledgement, NotificationArgs, NotificationHandler, NotificationTable,
};
pub use endpoint::{notification_router, NotificationEndpoint};
pub use settings::ClientSettings;
pub use transport::{HttpTransport, Transport};
