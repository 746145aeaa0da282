//! Crate-level error types
//!
//! Domain errors raised while serving a request (playlist failures, malformed
//! arguments) live next to the code that produces them and are answered on the
//! wire. The types here cover what escapes to the caller of the server.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Socket or file I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes on the wire could not be turned into a message
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Configuration could not be loaded or is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The downstream service stayed unreachable after every reconnect attempt
    #[error("downstream link lost; gave up after {attempts} reconnect attempts")]
    DownstreamFailed {
        /// Number of reconnect attempts made
        attempts: u32,
    },

    /// The dispatcher task panicked or was cancelled
    #[error("dispatcher task failed: {0}")]
    Dispatcher(#[from] tokio::task::JoinError),
}

/// Errors produced while tokenising a line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A word in the line was not valid UTF-8
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    /// The line exceeded the configured maximum length and was discarded
    #[error("line longer than {limit} bytes")]
    LineTooLong {
        /// Configured limit in bytes
        limit: usize,
    },
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        /// Path of the config file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has the wrong shape
    #[error("cannot parse {path}: {source}")]
    Parse {
        /// Path of the config file
        path: PathBuf,
        /// Underlying TOML error
        source: toml::de::Error,
    },

    /// An address could not be parsed or resolved
    #[error("invalid address {value:?}: {reason}")]
    InvalidAddress {
        /// Address as written in the config
        value: String,
        /// Why it was rejected
        reason: String,
    },
}
