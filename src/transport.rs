//! Socket plumbing shared by client connections and the downstream link
//!
//! Reader tasks turn bytes into frames and hand them to the dispatcher as
//! events. Writer tasks push queued bytes to the socket, with every write
//! bounded by a timeout so a stalled peer surfaces as an error instead of
//! blocking forever.

use std::fmt;
use std::future::Future;
use std::io;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::hub::HubEvent;
use crate::protocol::{Frame, Tokeniser};
use crate::server::HubConfig;

/// Socket settings shared by all connections
#[derive(Debug, Clone)]
pub(crate) struct TransportSettings {
    pub read_buffer_size: usize,
    pub max_line_length: usize,
    pub write_timeout: Duration,
    pub tcp_nodelay: bool,
}

impl From<&HubConfig> for TransportSettings {
    fn from(config: &HubConfig) -> Self {
        Self {
            read_buffer_size: config.read_buffer_size,
            max_line_length: config.max_line_length,
            write_timeout: config.write_timeout,
            tcp_nodelay: config.tcp_nodelay,
        }
    }
}

/// Why a reader stopped
#[derive(Debug)]
pub(crate) enum ReadEnd {
    /// The peer closed the connection
    Eof,
    /// The owner asked the reader to stop
    Closed,
    /// The socket failed
    Io(io::Error),
    /// The dispatcher is gone
    HubGone,
}

impl fmt::Display for ReadEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadEnd::Eof => write!(f, "connection closed by peer"),
            ReadEnd::Closed => write!(f, "closed locally"),
            ReadEnd::Io(e) => write!(f, "read failed: {}", e),
            ReadEnd::HubGone => write!(f, "dispatcher stopped"),
        }
    }
}

/// Read lines until EOF, error or `closed` resolves
///
/// Each complete line becomes an event via `to_event`. Malformed lines are
/// logged and skipped; the connection stays open.
pub(crate) async fn read_frames<R, F, C>(
    mut reader: R,
    settings: &TransportSettings,
    events: &mpsc::Sender<HubEvent>,
    mut to_event: F,
    closed: C,
) -> ReadEnd
where
    R: AsyncRead + Unpin,
    F: FnMut(Frame) -> HubEvent,
    C: Future<Output = ()>,
{
    let mut tokeniser = Tokeniser::with_max_line_length(settings.max_line_length);
    let mut buf = BytesMut::with_capacity(settings.read_buffer_size);
    tokio::pin!(closed);

    loop {
        buf.reserve(settings.read_buffer_size);

        let read = tokio::select! {
            _ = &mut closed => return ReadEnd::Closed,
            read = reader.read_buf(&mut buf) => read,
        };

        match read {
            Ok(0) => return ReadEnd::Eof,
            Ok(_) => {
                for result in tokeniser.tokenise(&mut buf) {
                    match result {
                        Ok(frame) => {
                            if events.send(to_event(frame)).await.is_err() {
                                return ReadEnd::HubGone;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Dropping malformed line");
                        }
                    }
                }
            }
            Err(e) => return ReadEnd::Io(e),
        }
    }
}

/// Write all of `data`, failing with `TimedOut` if it takes longer than `timeout`
pub(crate) async fn write_with_timeout<W>(
    writer: &mut W,
    data: &[u8],
    timeout: Duration,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    match tokio::time::timeout(timeout, writer.write_all(data)).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("write stalled for {:?}", timeout),
        )),
    }
}

/// Aborts the wrapped task when dropped
#[derive(Debug)]
pub(crate) struct TaskGuard<T>(pub JoinHandle<T>);

impl<T> TaskGuard<T> {
    pub fn handle(&mut self) -> &mut JoinHandle<T> {
        &mut self.0
    }
}

impl<T> Drop for TaskGuard<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}
