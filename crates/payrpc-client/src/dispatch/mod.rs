//! Notification dispatch.
//!
//! `table` holds the per-method handler lists and runs a verified
//! notification through them; `ack` models the signed acknowledgement that
//! is written back to the counterparty.

pub mod ack;
pub mod table;

pub use ack::{AckData, AckPolicy, AckStatus, Acknowledgement};
pub use table::{handler_fn, NotificationArgs, NotificationHandler, NotificationTable};
