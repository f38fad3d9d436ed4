//! Client lifecycle event types.

use std::sync::Arc;

use kview_proto::ClusterSnapshot;

use crate::error::ClientError;

/// The closed set of event categories consumers can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// Connection established.
    Connect,
    /// A snapshot frame was decoded.
    Message,
    /// Connection closed.
    Disconnect,
    /// A non-fatal failure occurred.
    Error,
}

impl EventCategory {
    /// Number of categories; sizes the dispatch table.
    pub(crate) const COUNT: usize = 4;

    /// Dispatch-table slot for this category.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Events raised by the client.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// The connection to the publisher is open.
    Connected,
    /// A frame decoded into a complete snapshot.
    Message(Arc<ClusterSnapshot>),
    /// The connection closed; the last snapshot remains valid.
    Disconnected,
    /// A non-fatal failure; see [`ClientError`] for the kind.
    Error(ClientError),
}

impl ClientEvent {
    /// The category this event dispatches under.
    #[must_use]
    pub fn category(&self) -> EventCategory {
        match self {
            Self::Connected => EventCategory::Connect,
            Self::Message(_) => EventCategory::Message,
            Self::Disconnected => EventCategory::Disconnect,
            Self::Error(_) => EventCategory::Error,
        }
    }
}
