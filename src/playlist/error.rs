//! Playlist error types
//!
//! Display strings are sent to clients inside `ACK FAIL`.

use thiserror::Error;

/// Error type for playlist operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaylistError {
    /// Another item already uses this hash
    #[error("Hash already exists")]
    DuplicateHash(String),

    /// The item at the index has a different hash than the client expected
    #[error("Hash does not match")]
    HashMismatch {
        /// Resolved index
        index: usize,
        /// Hash supplied by the client
        expected: String,
        /// Hash of the item actually at `index`
        actual: String,
    },

    /// The index does not resolve to a valid position
    #[error("Index out of range")]
    IndexOutOfRange {
        /// Index as supplied (possibly negative)
        index: i64,
        /// Number of valid positions
        bound: usize,
    },

    /// Only file items can be selected
    #[error("Can only select a file")]
    NotSelectable {
        /// Resolved index
        index: usize,
    },

    /// Deselect requested with nothing selected
    #[error("Nothing is selected")]
    NoSelection,
}
