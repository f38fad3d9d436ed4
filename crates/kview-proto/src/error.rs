//! Error types for the kview-proto crate.

use thiserror::Error;

/// Errors that can occur while encoding or decoding snapshot frames.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Failed to encode a snapshot.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to decode a frame into the snapshot schema.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// An identifier is repeated within its enclosing collection.
    #[error("duplicate id `{id}` in {scope}")]
    DuplicateId {
        /// Collection the duplicate was found in (e.g. "namespaces").
        scope: String,
        /// The repeated identifier.
        id: String,
    },
}
