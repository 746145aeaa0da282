//! Supervised connection to the playout service
//!
//! ```text
//!   Hub ──DownstreamHandle──► [mpsc queue] ──► writer loop ──► TCP ──► playout
//!    ▲                                                                   │
//!    └──────── HubEvent::DownstreamResponse ◄── reader task ◄── TCP ◄────┘
//! ```
//!
//! When the connection drops the supervisor reports `DownstreamLost`, then
//! reconnects on the [`ReconnectPolicy`] schedule. It reports
//! `DownstreamRestored` on success or `DownstreamFailed` once attempts run
//! out.

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::backoff::ReconnectPolicy;
use crate::error::Result;
use crate::hub::HubEvent;
use crate::registry::DeliveryError;
use crate::server::HubConfig;
use crate::transport::{read_frames, write_with_timeout, ReadEnd, TaskGuard, TransportSettings};

/// Dispatcher-side handle for sending to the playout service
#[derive(Debug, Clone)]
pub struct DownstreamHandle {
    tx: mpsc::Sender<Bytes>,
}

impl DownstreamHandle {
    /// Create a handle and the queue a link drains
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue a line without waiting
    pub fn send(&self, data: Bytes) -> std::result::Result<(), DeliveryError> {
        self.tx.try_send(data).map_err(DeliveryError::from)
    }
}

/// How one connection ended
enum SessionEnd {
    /// The connection failed; reconnect
    Lost(String),
    /// The dispatcher dropped its handle
    QueueClosed,
    /// The dispatcher stopped taking events
    HubGone,
}

/// Connection supervisor for the playout service
#[derive(Debug, Clone)]
pub struct DownstreamLink {
    addr: SocketAddr,
    policy: ReconnectPolicy,
    transport: TransportSettings,
    queue_capacity: usize,
}

impl DownstreamLink {
    /// Build a link from the hub configuration
    pub fn new(config: &HubConfig) -> Self {
        Self {
            addr: config.downstream_addr,
            policy: config.reconnect.clone(),
            transport: TransportSettings::from(config),
            queue_capacity: config.downstream_queue_capacity,
        }
    }

    /// Address of the playout service
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Connect and start the supervisor
    ///
    /// The first connection attempt is not retried: failure is returned to the
    /// caller. Responses are delivered to `events`.
    pub async fn start(
        self,
        events: mpsc::Sender<HubEvent>,
    ) -> Result<(DownstreamHandle, JoinHandle<()>)> {
        let stream = self.connect().await?;
        tracing::info!(addr = %self.addr, "Connected to playout service");

        let (handle, rx) = DownstreamHandle::new(self.queue_capacity);
        let span = tracing::info_span!("downstream", addr = %self.addr);
        let task = tokio::spawn(self.supervise(stream, rx, events).instrument(span));

        Ok((handle, task))
    }

    async fn connect(&self) -> std::io::Result<TcpStream> {
        let stream = TcpStream::connect(self.addr).await?;
        if self.transport.tcp_nodelay {
            stream.set_nodelay(true)?;
        }
        Ok(stream)
    }

    async fn supervise(
        self,
        mut stream: TcpStream,
        mut rx: mpsc::Receiver<Bytes>,
        events: mpsc::Sender<HubEvent>,
    ) {
        loop {
            let reason = match self.run_session(stream, &mut rx, &events).await {
                SessionEnd::Lost(reason) => reason,
                SessionEnd::QueueClosed | SessionEnd::HubGone => {
                    tracing::debug!("Downstream link stopped");
                    return;
                }
            };

            tracing::warn!(reason = %reason, "Lost connection to playout service");
            if events
                .send(HubEvent::DownstreamLost { reason })
                .await
                .is_err()
            {
                return;
            }

            // Lines queued for the dead connection are not replayed
            let mut dropped = 0usize;
            while rx.try_recv().is_ok() {
                dropped += 1;
            }
            if dropped > 0 {
                tracing::warn!(dropped, "Discarded lines queued for playout service");
            }

            stream = match self.reconnect().await {
                Ok(stream) => stream,
                Err(attempts) => {
                    tracing::error!(attempts, "Giving up on playout service");
                    let _ = events.send(HubEvent::DownstreamFailed { attempts }).await;
                    return;
                }
            };

            tracing::info!("Reconnected to playout service");
            if events.send(HubEvent::DownstreamRestored).await.is_err() {
                return;
            }
        }
    }

    /// Retry on the policy schedule; returns the attempt count on failure
    async fn reconnect(&self) -> std::result::Result<TcpStream, u32> {
        let mut attempts = 0;

        for delay in self.policy.schedule() {
            tokio::time::sleep(delay).await;
            attempts += 1;

            match self.connect().await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    tracing::warn!(attempt = attempts, error = %e, "Reconnect failed");
                }
            }
        }

        Err(attempts)
    }

    async fn run_session(
        &self,
        stream: TcpStream,
        rx: &mut mpsc::Receiver<Bytes>,
        events: &mpsc::Sender<HubEvent>,
    ) -> SessionEnd {
        let (read_half, mut write_half) = stream.into_split();

        let settings = self.transport.clone();
        let reader_events = events.clone();
        let mut reader = TaskGuard(tokio::spawn(
            async move {
                read_frames(
                    read_half,
                    &settings,
                    &reader_events,
                    HubEvent::DownstreamResponse,
                    std::future::pending(),
                )
                .await
            }
            .in_current_span(),
        ));

        loop {
            tokio::select! {
                end = reader.handle() => {
                    return match end {
                        Ok(ReadEnd::HubGone) => SessionEnd::HubGone,
                        Ok(end) => SessionEnd::Lost(end.to_string()),
                        Err(e) => SessionEnd::Lost(e.to_string()),
                    };
                }
                data = rx.recv() => match data {
                    Some(data) => {
                        if let Err(e) =
                            write_with_timeout(&mut write_half, &data, self.transport.write_timeout).await
                        {
                            return SessionEnd::Lost(format!("write failed: {}", e));
                        }
                    }
                    None => {
                        let _ = write_half.shutdown().await;
                        return SessionEnd::QueueClosed;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    use super::*;

    fn config(addr: SocketAddr) -> HubConfig {
        HubConfig::default().downstream(addr).reconnect(
            ReconnectPolicy::default()
                .delays(Duration::from_millis(10), Duration::from_millis(20))
                .max_attempts(3),
        )
    }

    #[tokio::test]
    async fn test_initial_connect_failure_is_an_error() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (tx, _rx) = mpsc::channel(8);
        assert!(DownstreamLink::new(&config(addr)).start(tx).await.is_err());
    }

    #[tokio::test]
    async fn test_forwards_both_ways() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut events) = mpsc::channel(8);

        let (handle, _task) = DownstreamLink::new(&config(addr)).start(tx).await.unwrap();
        let (socket, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = socket.into_split();
        let mut lines = BufReader::new(read_half).lines();

        handle.send(Bytes::from_static(b"play\n")).unwrap();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "play");

        write_half.write_all(b"STATE Playing\n").await.unwrap();
        match events.recv().await.unwrap() {
            HubEvent::DownstreamResponse(frame) => {
                assert_eq!(frame.message.words(), ["STATE", "Playing"]);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reconnects_after_loss() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut events) = mpsc::channel(8);

        let (_handle, _task) = DownstreamLink::new(&config(addr)).start(tx).await.unwrap();
        let (socket, _) = listener.accept().await.unwrap();
        drop(socket);

        assert!(matches!(
            events.recv().await.unwrap(),
            HubEvent::DownstreamLost { .. }
        ));

        let _second = listener.accept().await.unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            HubEvent::DownstreamRestored
        ));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut events) = mpsc::channel(8);

        let (_handle, _task) = DownstreamLink::new(&config(addr)).start(tx).await.unwrap();
        let (socket, _) = listener.accept().await.unwrap();
        drop(listener);
        drop(socket);

        assert!(matches!(
            events.recv().await.unwrap(),
            HubEvent::DownstreamLost { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            HubEvent::DownstreamFailed { attempts: 3 }
        ));
    }
}
