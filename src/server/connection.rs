//! Client connection tasks
//!
//! Each accepted socket is split into a reader task and a writer task. The
//! reader turns lines into [`HubEvent::ClientRequest`]s; the writer drains the
//! client's outbound queue. Neither touches hub state.

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, OwnedSemaphorePermit};
use tracing::Instrument;

use crate::hub::{DisconnectReason, HubEvent};
use crate::registry::{ClientHandle, ClientId};
use crate::transport::{read_frames, write_with_timeout, ReadEnd, TransportSettings};

/// Register a new client with the dispatcher and start its tasks
///
/// The handle is queued before the reader starts, so the dispatcher always
/// sees the connection before any of its requests.
pub(crate) async fn accept(
    id: ClientId,
    socket: TcpStream,
    peer_addr: SocketAddr,
    settings: TransportSettings,
    queue_capacity: usize,
    events: mpsc::Sender<HubEvent>,
    permit: Option<OwnedSemaphorePermit>,
) {
    let (handle, ends) = ClientHandle::new(id, peer_addr, queue_capacity);
    if events.send(HubEvent::ClientConnected(handle)).await.is_err() {
        tracing::debug!(client_id = %id, "Dispatcher stopped, dropping connection");
        return;
    }

    let (read_half, write_half) = socket.into_split();
    let span = tracing::debug_span!("client", client_id = %id, peer = %peer_addr);

    tokio::spawn(
        write_loop(
            id,
            write_half,
            ends.outbound,
            settings.clone(),
            events.clone(),
        )
        .instrument(span.clone()),
    );
    tokio::spawn(read_loop(id, read_half, settings, events, ends.closed, permit).instrument(span));
}

async fn read_loop(
    id: ClientId,
    read_half: OwnedReadHalf,
    settings: TransportSettings,
    events: mpsc::Sender<HubEvent>,
    closed: oneshot::Receiver<()>,
    // Held for the life of the connection
    _permit: Option<OwnedSemaphorePermit>,
) {
    let end = read_frames(
        read_half,
        &settings,
        &events,
        |frame| HubEvent::ClientRequest { id, frame },
        async {
            let _ = closed.await;
        },
    )
    .await;

    let reason = match end {
        // The dispatcher already forgot this client
        ReadEnd::Closed | ReadEnd::HubGone => return,
        ReadEnd::Eof => DisconnectReason::Closed,
        ReadEnd::Io(e) => DisconnectReason::ReadFailed(e.to_string()),
    };

    tracing::debug!(reason = %reason, "Reader finished");
    let _ = events
        .send(HubEvent::ClientDisconnected { id, reason })
        .await;
}

async fn write_loop(
    id: ClientId,
    mut write_half: OwnedWriteHalf,
    mut outbound: mpsc::Receiver<Bytes>,
    settings: TransportSettings,
    events: mpsc::Sender<HubEvent>,
) {
    while let Some(data) = outbound.recv().await {
        if let Err(e) = write_with_timeout(&mut write_half, &data, settings.write_timeout).await {
            tracing::debug!(error = %e, "Write failed");
            let reason = DisconnectReason::WriteFailed(e.to_string());
            let _ = events
                .send(HubEvent::ClientDisconnected { id, reason })
                .await;
            return;
        }
    }

    // Queue closed by the dispatcher: everything queued has been written
    let _ = write_half.shutdown().await;
}
