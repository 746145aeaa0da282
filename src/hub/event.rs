//! Events consumed by the dispatcher

use std::fmt;

use crate::protocol::Frame;
use crate::registry::{ClientHandle, ClientId};

/// Everything the dispatcher reacts to
///
/// Connection tasks and the downstream link only ever talk to the
/// dispatcher through these.
#[derive(Debug)]
pub enum HubEvent {
    /// A client was accepted; its handle is not registered yet
    ClientConnected(ClientHandle),
    /// A client's connection ended
    ClientDisconnected {
        id: ClientId,
        reason: DisconnectReason,
    },
    /// A client sent a line
    ClientRequest { id: ClientId, frame: Frame },
    /// The playout service sent a line
    DownstreamResponse(Frame),
    /// The connection to the playout service dropped
    DownstreamLost { reason: String },
    /// The playout service is reachable again
    DownstreamRestored,
    /// Reconnection gave up
    DownstreamFailed { attempts: u32 },
    /// Stop the hub
    Shutdown,
}

/// Why a client was disconnected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The client closed the connection
    Closed,
    /// Reading from the socket failed
    ReadFailed(String),
    /// Writing to the socket failed or timed out
    WriteFailed(String),
    /// The client's outbound queue overflowed
    SlowConsumer,
    /// The hub is shutting down
    Shutdown,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::Closed => write!(f, "closed by client"),
            DisconnectReason::ReadFailed(e) => write!(f, "read failed: {}", e),
            DisconnectReason::WriteFailed(e) => write!(f, "write failed: {}", e),
            DisconnectReason::SlowConsumer => write!(f, "outbound queue overflowed"),
            DisconnectReason::Shutdown => write!(f, "hub shutting down"),
        }
    }
}
