//! # kview-client
//!
//! Real-time state-synchronization client for the kview cluster viewer.
//!
//! [`StreamClient`] owns one persistent WebSocket connection to the snapshot
//! publisher and translates wire activity into typed lifecycle events
//! (`connect`, `message`, `disconnect`, `error`). Consumers subscribe through
//! [`StreamClient::on`]; the [`projection::SnapshotStore`] turns `message`
//! events into the single authoritative snapshot presentation reads from.
//! Reconnection is an opt-in policy ([`reconnect::ReconnectPolicy`]) layered
//! above the client, never part of its state machine.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bus;
mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod projection;
pub mod reconnect;
mod state;

pub use bus::{HandlerError, HandlerId};
pub use client::StreamClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use events::{ClientEvent, EventCategory};
pub use projection::{SnapshotStore, StoreStatus};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
