//! The dispatcher
//!
//! A single task owns every piece of shared state and consumes
//! [`HubEvent`]s one at a time:
//!
//! ```text
//!   client readers ──┐                         ┌──► client queues (broadcast / reply)
//!                    ├──► [event queue] ──► Hub ┤
//!   downstream link ─┘                         └──► downstream queue (forward / load / eject)
//! ```
//!
//! Handling an event never waits: every send is a `try_send` into a bounded
//! queue, and all the lines one event produces for a client share a single
//! slot. A client that cannot keep up is disconnected. While the playout
//! service is unreachable the hub runs degraded: playlist commands still
//! work, forwarded requests are refused and side effects are dropped.

use std::ops::ControlFlow;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::downstream::{DownstreamHandle, DownstreamState};
use crate::error::{Error, Result};
use crate::playlist::Playlist;
use crate::protocol::constants::ACK_FAIL;
use crate::protocol::{pack_all, Frame, Message};
use crate::registry::{ClientHandle, ClientId, ClientRegistry, DeliveryError};
use crate::server::HubConfig;
use crate::stats::HubStats;

use super::event::{DisconnectReason, HubEvent};
use super::handlers::{ack, selection_outcome, LocalCommand, Outcome};
use super::handshake::{self, HubIdentity};
use super::responses::route_response;

/// Reason given when a forwarded request cannot reach the playout service
const DOWNSTREAM_UNAVAILABLE: &str = "downstream unavailable";

/// Hub state and the logic that mutates it
#[derive(Debug)]
pub struct Hub {
    identity: HubIdentity,
    registry: ClientRegistry,
    playlist: Playlist,
    downstream_state: DownstreamState,
    downstream: DownstreamHandle,
    link: Option<AbortHandle>,
    degraded: bool,
    stats: HubStats,
    stats_interval: Duration,
}

impl Hub {
    /// Create a hub that sends to the playout service through `downstream`
    pub fn new(config: &HubConfig, downstream: DownstreamHandle) -> Self {
        Self {
            identity: config.identity.clone(),
            registry: ClientRegistry::new(),
            playlist: Playlist::with_policy(config.select_policy()),
            downstream_state: DownstreamState::new(),
            downstream,
            link: None,
            degraded: false,
            stats: HubStats::new(),
            stats_interval: config.stats_interval,
        }
    }

    /// Stop the downstream link task when the hub closes
    pub fn with_link(mut self, link: AbortHandle) -> Self {
        self.link = Some(link);
        self
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn downstream_state(&self) -> &DownstreamState {
        &self.downstream_state
    }

    /// Whether the playout service is currently unreachable
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn stats(&self) -> &HubStats {
        &self.stats
    }

    /// Process events until shutdown
    ///
    /// Returns the final statistics, or [`Error::DownstreamFailed`] if the
    /// playout service could not be reconnected. Every client is closed
    /// either way.
    pub async fn run(mut self, mut events: mpsc::Receiver<HubEvent>) -> Result<HubStats> {
        tracing::info!(identity = %self.identity.tag(), "Dispatcher started");

        let log_stats = !self.stats_interval.is_zero();
        let period = self.stats_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);

        let result = loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if let ControlFlow::Break(result) = self.handle_event(event) {
                            break result;
                        }
                    }
                    None => break Ok(()),
                },
                _ = ticker.tick(), if log_stats => self.stats.log(),
            }
        };

        self.close();
        self.stats.log();
        tracing::info!("Dispatcher stopped");

        result.map(|()| self.stats.clone())
    }

    /// Apply one event; `Break` ends the event loop with the given result
    pub fn handle_event(&mut self, event: HubEvent) -> ControlFlow<Result<()>> {
        match event {
            HubEvent::ClientConnected(handle) => self.on_client_connected(handle),
            HubEvent::ClientDisconnected { id, reason } => self.disconnect(id, reason),
            HubEvent::ClientRequest { id, frame } => self.on_client_request(id, frame),
            HubEvent::DownstreamResponse(frame) => self.on_downstream_response(frame),
            HubEvent::DownstreamLost { reason } => {
                tracing::warn!(reason = %reason, "Playout service lost, running degraded");
                self.degraded = true;
                self.stats.downstream_losses += 1;
            }
            HubEvent::DownstreamRestored => self.on_downstream_restored(),
            HubEvent::DownstreamFailed { attempts } => {
                tracing::error!(attempts, "Playout service unreachable, shutting down");
                return ControlFlow::Break(Err(Error::DownstreamFailed { attempts }));
            }
            HubEvent::Shutdown => {
                tracing::info!("Shutdown requested");
                return ControlFlow::Break(Ok(()));
            }
        }

        ControlFlow::Continue(())
    }

    /// Disconnect every client and stop the downstream link
    pub fn close(&mut self) {
        for handle in self.registry.drain() {
            tracing::debug!(
                client_id = %handle.id(),
                reason = %DisconnectReason::Shutdown,
                "Closing client"
            );
            self.stats.connection_closed();
        }

        if let Some(link) = self.link.take() {
            link.abort();
        }
    }

    fn on_client_connected(&mut self, handle: ClientHandle) {
        let id = handle.id();
        self.stats.connection_opened();
        tracing::info!(client_id = %id, peer = %handle.peer_addr(), "Client connected");

        // The handshake goes in before the client is registered, so it always
        // precedes broadcasts
        let (greeting, features) = handshake::compose(&self.identity, &self.downstream_state);
        if let Err(e) = handle.send(pack_all([&greeting, &features])) {
            tracing::warn!(client_id = %id, error = %e, "Could not greet client");
            self.stats.connection_closed();
            return;
        }

        if let Some(stale) = self.registry.insert(handle) {
            tracing::warn!(client_id = %stale.id(), "Replaced client with duplicate ID");
            self.stats.connection_closed();
        }
    }

    /// Remove a client; unknown IDs are ignored
    fn disconnect(&mut self, id: ClientId, reason: DisconnectReason) {
        let Some(handle) = self.registry.remove(id) else {
            tracing::trace!(client_id = %id, "Client already gone");
            return;
        };

        if reason == DisconnectReason::SlowConsumer {
            self.stats.slow_client_drops += 1;
            tracing::warn!(
                client_id = %id,
                peer = %handle.peer_addr(),
                queued = handle.queued(),
                "Dropping slow client"
            );
        } else {
            tracing::info!(
                client_id = %id,
                peer = %handle.peer_addr(),
                reason = %reason,
                connected_secs = handle.connected_for().as_secs(),
                "Client disconnected"
            );
        }

        self.stats.connection_closed();
    }

    fn on_client_request(&mut self, id: ClientId, frame: Frame) {
        if !self.registry.contains(id) {
            tracing::debug!(client_id = %id, "Ignoring request from closed client");
            return;
        }

        match LocalCommand::from_verb(frame.message.verb()) {
            Some(command) => {
                tracing::debug!(client_id = %id, request = %frame.message, "Local request");
                self.stats.local_requests += 1;
                let outcome = command.handle(&mut self.playlist, &frame.message);
                self.apply(Some(id), outcome, None);
            }
            None => self.forward(id, frame),
        }
    }

    /// Pass a request on to the playout service unchanged
    fn forward(&mut self, id: ClientId, frame: Frame) {
        if self.degraded {
            self.stats.rejected_requests += 1;
            self.reply(id, &ack(ACK_FAIL, DOWNSTREAM_UNAVAILABLE, &frame.message));
            return;
        }

        tracing::trace!(client_id = %id, request = %frame.message, "Forwarding request");
        match self.downstream.send(frame.raw) {
            Ok(()) => self.stats.forwarded_requests += 1,
            Err(e) => {
                tracing::warn!(client_id = %id, error = %e, "Could not forward request");
                self.stats.rejected_requests += 1;
                self.reply(id, &ack(ACK_FAIL, DOWNSTREAM_UNAVAILABLE, &frame.message));
            }
        }
    }

    fn on_downstream_response(&mut self, frame: Frame) {
        self.stats.downstream_responses += 1;
        tracing::trace!(response = %frame.message, "Playout response");

        let outcome = route_response(
            &mut self.downstream_state,
            &mut self.playlist,
            &frame.message,
        );
        self.apply(None, outcome, Some(&frame.raw));
    }

    fn on_downstream_restored(&mut self) {
        tracing::info!("Playout service restored");
        self.degraded = false;
        self.stats.downstream_reconnects += 1;

        // A fresh greeting is on its way from the new connection
        self.downstream_state.reset();

        // The service starts empty; reload whatever is selected
        if self.playlist.has_selection() {
            for message in selection_outcome(&self.playlist).downstream {
                self.send_downstream(&message);
            }
        }
    }

    /// Deliver an outcome; `raw` is the line relayed when `outcome.relay` is set
    fn apply(&mut self, requester: Option<ClientId>, outcome: Outcome, raw: Option<&Bytes>) {
        let relayed = raw.filter(|_| outcome.relay);
        match (relayed, outcome.broadcast.is_empty()) {
            (Some(raw), true) => self.broadcast(raw.clone()),
            (Some(raw), false) => {
                let mut buf = BytesMut::from(&raw[..]);
                for message in &outcome.broadcast {
                    message.pack_into(&mut buf);
                }
                self.broadcast(buf.freeze());
            }
            (None, false) => self.broadcast(pack_all(&outcome.broadcast)),
            (None, true) => {}
        }

        if let Some(id) = requester {
            if !outcome.reply.is_empty() {
                self.send_to(id, pack_all(&outcome.reply));
            }
        }

        for message in &outcome.downstream {
            self.send_downstream(message);
        }
    }

    fn broadcast(&mut self, data: Bytes) {
        self.stats.broadcasts += 1;
        for (id, err) in self.registry.broadcast(&data) {
            self.delivery_failed(id, err);
        }
    }

    fn reply(&mut self, id: ClientId, message: &Message) {
        self.send_to(id, message.pack());
    }

    fn send_to(&mut self, id: ClientId, data: Bytes) {
        if let Err(err) = self.registry.send_to(id, data) {
            self.delivery_failed(id, err);
        }
    }

    fn delivery_failed(&mut self, id: ClientId, err: DeliveryError) {
        let reason = match err {
            DeliveryError::QueueFull => DisconnectReason::SlowConsumer,
            DeliveryError::Closed => DisconnectReason::WriteFailed(err.to_string()),
        };
        self.disconnect(id, reason);
    }

    fn send_downstream(&mut self, message: &Message) {
        if self.degraded {
            tracing::warn!(message = %message, "Playout service unavailable, dropping");
            return;
        }

        if let Err(e) = self.downstream.send(message.pack()) {
            tracing::warn!(message = %message, error = %e, "Could not queue for playout service");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    use super::*;
    use crate::protocol::Tokeniser;
    use crate::registry::ClientEnds;

    struct Harness {
        hub: Hub,
        downstream: mpsc::Receiver<Bytes>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_config(HubConfig::default())
        }

        fn with_config(config: HubConfig) -> Self {
            let (handle, downstream) = DownstreamHandle::new(16);
            Self {
                hub: Hub::new(&config, handle),
                downstream,
            }
        }

        fn connect(&mut self, id: u64) -> ClientEnds {
            self.connect_with_capacity(id, 64)
        }

        fn connect_with_capacity(&mut self, id: u64, capacity: usize) -> ClientEnds {
            let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 50000 + id as u16);
            let (handle, ends) = ClientHandle::new(ClientId(id), addr, capacity);
            assert!(self.hub.handle_event(HubEvent::ClientConnected(handle)).is_continue());
            ends
        }

        fn request(&mut self, id: u64, line: &str) {
            let frame = frame(line);
            let event = HubEvent::ClientRequest {
                id: ClientId(id),
                frame,
            };
            assert!(self.hub.handle_event(event).is_continue());
        }

        fn respond(&mut self, line: &str) {
            let event = HubEvent::DownstreamResponse(frame(line));
            assert!(self.hub.handle_event(event).is_continue());
        }

        fn sent_downstream(&mut self) -> Vec<String> {
            drain(&mut self.downstream)
        }
    }

    fn frame(line: &str) -> Frame {
        let mut buf = BytesMut::from(line);
        Tokeniser::new().next_frame(&mut buf).unwrap().unwrap()
    }

    /// Every queued line, whatever entry it arrived in
    fn drain(rx: &mut mpsc::Receiver<Bytes>) -> Vec<String> {
        drain_entries(rx)
            .iter()
            .flat_map(|entry| entry.split_inclusive('\n').map(str::to_string))
            .collect()
    }

    /// Queued entries as sent, one per slot
    fn drain_entries(rx: &mut mpsc::Receiver<Bytes>) -> Vec<String> {
        let mut entries = Vec::new();
        while let Ok(data) = rx.try_recv() {
            entries.push(String::from_utf8(data.to_vec()).unwrap());
        }
        entries
    }

    fn greeting() -> [String; 2] {
        [
            format!("OHAI listd-{}\n", env!("CARGO_PKG_VERSION")),
            "FEATURES Playlist PlaylistTextItems\n".to_string(),
        ]
    }

    #[test]
    fn test_handshake_comes_first() {
        let mut h = Harness::new();
        let mut ends = h.connect(1);

        assert_eq!(drain(&mut ends.outbound), greeting());
        assert_eq!(h.hub.registry().len(), 1);
        assert_eq!(h.hub.stats().active_connections, 1);
    }

    #[test]
    fn test_handshake_reflects_downstream() {
        let mut h = Harness::new();
        let mut early = h.connect(1);
        drain(&mut early.outbound);

        h.respond("OHAI 'playd-0.2.0'\n");
        h.respond("FEATURES FileLoad PlayStop End\n");

        // Neither is passed on to existing clients
        assert!(drain(&mut early.outbound).is_empty());

        let mut late = h.connect(2);
        assert_eq!(
            drain(&mut late.outbound),
            [
                format!("OHAI listd-{}/playd-0.2.0\n", env!("CARGO_PKG_VERSION")),
                "FEATURES PlayStop End Playlist PlaylistTextItems\n".to_string(),
            ]
        );
    }

    #[test]
    fn test_success_is_broadcast() {
        let mut h = Harness::new();
        let mut a = h.connect(1);
        let mut b = h.connect(2);
        drain(&mut a.outbound);
        drain(&mut b.outbound);

        h.request(1, "enqueue 0 h1 file a.mp3\n");

        assert_eq!(drain(&mut a.outbound), ["ENQUEUE 0 h1 file a.mp3\n"]);
        assert_eq!(drain(&mut b.outbound), ["ENQUEUE 0 h1 file a.mp3\n"]);
        assert!(h.sent_downstream().is_empty());
    }

    #[test]
    fn test_failure_goes_to_requester_only() {
        let mut h = Harness::new();
        let mut a = h.connect(1);
        let mut b = h.connect(2);
        drain(&mut a.outbound);
        drain(&mut b.outbound);

        h.request(1, "dequeue 0 h1\n");

        assert_eq!(
            drain(&mut a.outbound),
            ["ACK FAIL 'Index out of range' dequeue 0 h1\n"]
        );
        assert!(drain(&mut b.outbound).is_empty());
    }

    #[test]
    fn test_list_goes_to_requester_only() {
        let mut h = Harness::new();
        let mut a = h.connect(1);
        let mut b = h.connect(2);
        h.request(1, "enqueue 0 h1 file a.mp3\n");
        drain(&mut a.outbound);
        drain(&mut b.outbound);

        h.request(2, "list\n");

        assert!(drain(&mut a.outbound).is_empty());
        assert_eq!(
            drain(&mut b.outbound),
            ["COUNT 1\n", "ITEM 0 h1 file a.mp3\n"]
        );
    }

    #[test]
    fn test_unknown_verb_forwarded_verbatim() {
        let mut h = Harness::new();
        let mut a = h.connect(1);
        drain(&mut a.outbound);

        h.request(1, "seek   \"1m 30s\"\n");

        assert_eq!(h.sent_downstream(), ["seek   \"1m 30s\"\n"]);
        assert!(drain(&mut a.outbound).is_empty());
        assert_eq!(h.hub.stats().forwarded_requests, 1);
    }

    #[test]
    fn test_select_loads_downstream() {
        let mut h = Harness::new();
        let mut a = h.connect(1);
        h.request(1, "enqueue 0 h1 file '/music/a track.mp3'\n");
        drain(&mut a.outbound);

        h.request(1, "select 0 h1\n");

        assert_eq!(drain(&mut a.outbound), ["SELECT 0 h1\n"]);
        assert_eq!(h.sent_downstream(), ["load '/music/a track.mp3'\n"]);
    }

    #[test]
    fn test_reserved_verbs_not_forwarded() {
        let mut h = Harness::new();
        let mut a = h.connect(1);
        drain(&mut a.outbound);

        h.request(1, "load a.mp3\n");

        assert_eq!(drain(&mut a.outbound), ["ACK WHAT 'Bad command' load a.mp3\n"]);
        assert!(h.sent_downstream().is_empty());
    }

    #[test]
    fn test_downstream_responses_relayed_raw() {
        let mut h = Harness::new();
        let mut a = h.connect(1);
        drain(&mut a.outbound);

        h.respond("STATE  Playing\n");
        h.respond("TIME 42000\n");

        assert_eq!(drain(&mut a.outbound), ["STATE  Playing\n", "TIME 42000\n"]);
        assert_eq!(h.hub.downstream_state().last_state(), Some("Playing"));
        assert_eq!(h.hub.downstream_state().last_time(), Some("42000"));
    }

    #[test]
    fn test_end_advances_to_next_file() {
        let mut h = Harness::new();
        let mut a = h.connect(1);
        h.request(1, "enqueue 0 h1 file a.mp3\n");
        h.request(1, "enqueue 1 t1 text 'Travel news'\n");
        h.request(1, "enqueue 2 h2 file b.mp3\n");
        h.request(1, "select 0 h1\n");
        drain(&mut a.outbound);
        h.sent_downstream();

        h.respond("END\n");

        assert_eq!(drain(&mut a.outbound), ["END\n", "SELECT 2 h2\n"]);
        assert_eq!(h.sent_downstream(), ["load b.mp3\n"]);
    }

    #[test]
    fn test_degraded_mode() {
        let mut h = Harness::new();
        let mut a = h.connect(1);
        drain(&mut a.outbound);

        assert!(h
            .hub
            .handle_event(HubEvent::DownstreamLost {
                reason: "connection reset".into()
            })
            .is_continue());
        assert!(h.hub.is_degraded());

        // Forwarded requests are refused
        h.request(1, "play\n");
        assert_eq!(
            drain(&mut a.outbound),
            ["ACK FAIL 'downstream unavailable' play\n"]
        );

        // Playlist commands keep working, side effects are dropped
        h.request(1, "enqueue 0 h1 file a.mp3\n");
        h.request(1, "select 0 h1\n");
        assert_eq!(
            drain(&mut a.outbound),
            ["ENQUEUE 0 h1 file a.mp3\n", "SELECT 0 h1\n"]
        );
        assert!(h.sent_downstream().is_empty());

        // On restore the selection is reloaded
        assert!(h.hub.handle_event(HubEvent::DownstreamRestored).is_continue());
        assert!(!h.hub.is_degraded());
        assert_eq!(h.sent_downstream(), ["load a.mp3\n"]);

        h.request(1, "play\n");
        assert_eq!(h.sent_downstream(), ["play\n"]);
        assert_eq!(h.hub.stats().rejected_requests, 1);
        assert_eq!(h.hub.stats().downstream_reconnects, 1);
    }

    #[test]
    fn test_downstream_failure_stops_hub() {
        let mut h = Harness::new();
        let flow = h
            .hub
            .handle_event(HubEvent::DownstreamFailed { attempts: 5 });

        match flow {
            ControlFlow::Break(Err(Error::DownstreamFailed { attempts })) => {
                assert_eq!(attempts, 5)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_client_is_dropped() {
        let mut h = Harness::new();
        let mut fast = h.connect(1);
        // Room for the handshake and nothing else
        let mut slow = h.connect_with_capacity(2, 1);

        h.request(1, "enqueue 0 h1 file a.mp3\n");

        assert!(!h.hub.registry().contains(ClientId(2)));
        assert!(h.hub.registry().contains(ClientId(1)));
        assert_eq!(h.hub.stats().slow_client_drops, 1);

        // The slow client's writer drains what it has, then sees the close
        assert_eq!(drain(&mut slow.outbound), greeting());
        assert!(slow.outbound.recv().await.is_none());
        assert!(slow.closed.await.is_err());

        let lines = drain(&mut fast.outbound);
        assert_eq!(lines.last().map(String::as_str), Some("ENQUEUE 0 h1 file a.mp3\n"));
    }

    #[test]
    fn test_handshake_takes_one_slot() {
        let mut h = Harness::with_config(HubConfig::default().client_queue_capacity(1));
        let mut a = h.connect_with_capacity(1, 1);

        assert!(h.hub.registry().contains(ClientId(1)));
        assert_eq!(drain_entries(&mut a.outbound), [greeting().concat()]);

        // With the queue drained the client keeps hearing broadcasts
        h.request(1, "enqueue 0 h1 file a.mp3\n");
        assert_eq!(drain(&mut a.outbound), ["ENQUEUE 0 h1 file a.mp3\n"]);
        assert_eq!(h.hub.stats().slow_client_drops, 0);
    }

    #[test]
    fn test_list_larger_than_queue() {
        let mut h = Harness::with_config(HubConfig::default().client_queue_capacity(8));
        let mut a = h.connect_with_capacity(1, 8);
        for n in 0..10 {
            h.request(1, &format!("enqueue -1 h{} file f{}.mp3\n", n, n));
            drain(&mut a.outbound);
        }

        h.request(1, "list\n");

        assert!(h.hub.registry().contains(ClientId(1)));
        assert_eq!(h.hub.stats().slow_client_drops, 0);

        let entries = drain_entries(&mut a.outbound);
        assert_eq!(entries.len(), 1);
        let lines: Vec<&str> = entries[0].lines().collect();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "COUNT 10");
        assert_eq!(lines[10], "ITEM 9 h9 file f9.mp3");
    }

    #[test]
    fn test_end_and_reselect_share_one_slot() {
        let mut h = Harness::new();
        let mut a = h.connect(1);
        h.request(1, "enqueue 0 h1 file a.mp3\n");
        h.request(1, "enqueue 1 h2 file b.mp3\n");
        h.request(1, "select 0 h1\n");
        drain(&mut a.outbound);

        h.respond("END\n");

        assert_eq!(drain_entries(&mut a.outbound), ["END\nSELECT 1 h2\n"]);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut h = Harness::new();
        let _a = h.connect(1);

        for _ in 0..2 {
            let event = HubEvent::ClientDisconnected {
                id: ClientId(1),
                reason: DisconnectReason::Closed,
            };
            assert!(h.hub.handle_event(event).is_continue());
        }

        assert!(h.hub.registry().is_empty());
        assert_eq!(h.hub.stats().active_connections, 0);
    }

    #[test]
    fn test_request_from_departed_client_ignored() {
        let mut h = Harness::new();
        let _a = h.connect(1);
        let disconnect = HubEvent::ClientDisconnected {
            id: ClientId(1),
            reason: DisconnectReason::Closed,
        };
        assert!(h.hub.handle_event(disconnect).is_continue());

        h.request(1, "play\n");
        h.request(1, "enqueue 0 h1 file a.mp3\n");

        assert!(h.sent_downstream().is_empty());
        assert!(h.hub.playlist().is_empty());
    }

    #[test]
    fn test_select_any_item_policy() {
        let config = HubConfig::default().select_files_only(false);
        let mut h = Harness::with_config(config);
        let mut a = h.connect(1);
        h.request(1, "enqueue 0 t1 text 'Station ident'\n");
        drain(&mut a.outbound);

        h.request(1, "select 0 t1\n");
        assert_eq!(drain(&mut a.outbound), ["SELECT 0 t1\n"]);
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let (handle, _downstream) = DownstreamHandle::new(16);
        let hub = Hub::new(&HubConfig::default(), handle);
        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(hub.run(rx));

        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 50000);
        let (client, mut ends) = ClientHandle::new(ClientId(1), addr, 16);
        tx.send(HubEvent::ClientConnected(client)).await.unwrap();
        tx.send(HubEvent::ClientRequest {
            id: ClientId(1),
            frame: frame("enqueue 0 h1 file a.mp3\n"),
        })
        .await
        .unwrap();
        tx.send(HubEvent::Shutdown).await.unwrap();

        let stats = task.await.unwrap().unwrap();
        assert_eq!(stats.total_connections, 1);
        assert_eq!(stats.active_connections, 0);
        assert_eq!(stats.local_requests, 1);

        // Handshake, broadcast, then the queue closes
        assert_eq!(ends.outbound.recv().await.unwrap(), greeting().concat());
        assert_eq!(&ends.outbound.recv().await.unwrap()[..], b"ENQUEUE 0 h1 file a.mp3\n");
        assert!(ends.outbound.recv().await.is_none());
    }
}
