//! Error types for the kview client.

use thiserror::Error;

/// Failures surfaced through the `error` event category.
///
/// All kinds are non-fatal: they are reported and logged, and none of them
/// terminate the client. A `Transport` failure is always followed by a
/// disconnect event; a `Parse` failure leaves the connection open and the
/// previous snapshot in place.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Connection-level failure (refused, reset, handshake timeout).
    #[error("transport failure: {0}")]
    Transport(String),

    /// A frame arrived but did not decode into the snapshot schema.
    #[error("frame decode failed: {0}")]
    Parse(String),

    /// An outbound send was attempted while the connection was not open.
    #[error("not connected")]
    NotConnected,
}
