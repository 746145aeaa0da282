//! Client handle types
//!
//! A [`ClientHandle`] is the dispatcher's side of one client connection: a
//! bounded outbound queue drained by the connection's writer task, and a
//! close signal watched by its reader task. Dropping the handle closes both,
//! so removing a client from the registry is enough to tear it down.

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use super::error::DeliveryError;

/// Unique identifier of a client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The connection-task side of a [`ClientHandle`]
#[derive(Debug)]
pub struct ClientEnds {
    /// Data to write to the socket, in order
    pub outbound: mpsc::Receiver<Bytes>,
    /// Resolves when the handle is dropped
    pub closed: oneshot::Receiver<()>,
}

/// Dispatcher-owned handle of a connected client
#[derive(Debug)]
pub struct ClientHandle {
    id: ClientId,
    peer_addr: SocketAddr,
    tx: mpsc::Sender<Bytes>,
    // Never sent on; dropping it wakes the reader task
    _closer: oneshot::Sender<()>,
    connected_at: Instant,
}

impl ClientHandle {
    /// Create a handle with an outbound queue of `capacity` messages
    ///
    /// Returns the handle and the ends the connection tasks consume.
    pub fn new(id: ClientId, peer_addr: SocketAddr, capacity: usize) -> (Self, ClientEnds) {
        let (tx, outbound) = mpsc::channel(capacity.max(1));
        let (closer, closed) = oneshot::channel();

        let handle = Self {
            id,
            peer_addr,
            tx,
            _closer: closer,
            connected_at: Instant::now(),
        };

        (handle, ClientEnds { outbound, closed })
    }

    /// Connection ID
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Remote address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Time since the client connected
    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Messages waiting in the outbound queue
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Queue data without waiting
    ///
    /// Fails with [`DeliveryError::QueueFull`] if the writer has fallen behind
    /// by a whole queue, or [`DeliveryError::Closed`] if it has exited.
    pub fn send(&self, data: Bytes) -> Result<(), DeliveryError> {
        self.tx.try_send(data).map_err(DeliveryError::from)
    }
}
