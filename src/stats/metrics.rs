//! Statistics for the hub

use std::time::{Duration, Instant};

/// Hub-wide counters, owned by the dispatcher
#[derive(Debug, Clone)]
pub struct HubStats {
    /// When the dispatcher started
    pub started_at: Instant,
    /// Total connections ever
    pub total_connections: u64,
    /// Current active connections
    pub active_connections: u64,
    /// Requests served by the hub itself
    pub local_requests: u64,
    /// Requests passed on to the playout service
    pub forwarded_requests: u64,
    /// Forwarded requests refused while the playout service was unreachable
    pub rejected_requests: u64,
    /// Lines sent to every client
    pub broadcasts: u64,
    /// Lines received from the playout service
    pub downstream_responses: u64,
    /// Clients dropped for not draining their queue
    pub slow_client_drops: u64,
    /// Times the playout service connection was lost
    pub downstream_losses: u64,
    /// Times it came back
    pub downstream_reconnects: u64,
}

impl Default for HubStats {
    fn default() -> Self {
        Self {
            started_at: Instant::now(),
            total_connections: 0,
            active_connections: 0,
            local_requests: 0,
            forwarded_requests: 0,
            rejected_requests: 0,
            broadcasts: 0,
            downstream_responses: 0,
            slow_client_drops: 0,
            downstream_losses: 0,
            downstream_reconnects: 0,
        }
    }
}

impl HubStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time since the dispatcher started
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Record a new connection
    pub fn connection_opened(&mut self) {
        self.total_connections += 1;
        self.active_connections += 1;
    }

    /// Record a closed connection
    pub fn connection_closed(&mut self) {
        self.active_connections = self.active_connections.saturating_sub(1);
    }

    /// Total requests received from clients
    pub fn total_requests(&self) -> u64 {
        self.local_requests + self.forwarded_requests + self.rejected_requests
    }

    /// Emit the counters as a structured log event
    pub fn log(&self) {
        tracing::info!(
            uptime_secs = self.uptime().as_secs(),
            active_connections = self.active_connections,
            total_connections = self.total_connections,
            local_requests = self.local_requests,
            forwarded_requests = self.forwarded_requests,
            rejected_requests = self.rejected_requests,
            broadcasts = self.broadcasts,
            downstream_responses = self.downstream_responses,
            slow_client_drops = self.slow_client_drops,
            downstream_losses = self.downstream_losses,
            downstream_reconnects = self.downstream_reconnects,
            "Hub statistics"
        );
    }
}
