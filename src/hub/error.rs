//! Request error types
//!
//! Both kinds are answered to the requester only. Display strings become the
//! reason word of the `ACK`.

use thiserror::Error;

use crate::playlist::PlaylistError;

/// The request is malformed; answered with `ACK WHAT`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Bad command")]
    WrongArity { verb: &'static str, got: usize },

    /// `load` and `eject` are reserved for the hub itself
    #[error("Bad command")]
    Reserved(&'static str),

    #[error("Invalid index")]
    InvalidIndex(String),

    #[error("Invalid item type")]
    InvalidItemType(String),
}

/// Why a local command did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Answered with `ACK WHAT`
    #[error(transparent)]
    Invalid(#[from] RequestError),

    /// Answered with `ACK FAIL`
    #[error(transparent)]
    Failed(#[from] PlaylistError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons() {
        let err: CommandError = RequestError::WrongArity { verb: "list", got: 1 }.into();
        assert_eq!(err.to_string(), "Bad command");

        let err: CommandError = PlaylistError::NoSelection.into();
        assert_eq!(err.to_string(), "Nothing is selected");
    }
}
