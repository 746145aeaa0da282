//! Registry error types
//!
//! Error types for queueing data to a connection.

use thiserror::Error;

/// Why a message could not be queued for a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The outbound queue is at capacity; the peer is not keeping up
    #[error("outbound queue full")]
    QueueFull,
    /// The writer task has exited
    #[error("connection closed")]
    Closed,
}

impl<T> From<tokio::sync::mpsc::error::TrySendError<T>> for DeliveryError {
    fn from(err: tokio::sync::mpsc::error::TrySendError<T>) -> Self {
        match err {
            tokio::sync::mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            tokio::sync::mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        }
    }
}
