//! Hub server listener
//!
//! Connects to the playout service, starts the dispatcher, then runs the TCP
//! accept loop until shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Semaphore};

use crate::downstream::DownstreamLink;
use crate::error::Result;
use crate::hub::{Hub, HubEvent};
use crate::registry::ClientId;
use crate::server::config::HubConfig;
use crate::server::connection;
use crate::stats::HubStats;
use crate::transport::TransportSettings;

/// Playlist hub server
pub struct HubServer {
    config: HubConfig,
    next_client_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl HubServer {
    /// Create a new server with the given configuration
    pub fn new(config: HubConfig) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            next_client_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Run the server
    ///
    /// Returns only if the playout service is lost for good.
    pub async fn run(&self) -> Result<HubStats> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<HubStats>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.listen_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve clients from an already bound listener
    ///
    /// Connects to the playout service first; if that fails the error is
    /// returned and no client is accepted.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<HubStats>
    where
        F: Future<Output = ()>,
    {
        let (events_tx, events_rx) = mpsc::channel(self.config.event_queue_capacity.max(1));

        let (downstream, link_task) = DownstreamLink::new(&self.config)
            .start(events_tx.clone())
            .await?;

        let hub = Hub::new(&self.config, downstream).with_link(link_task.abort_handle());
        let mut dispatcher = tokio::spawn(hub.run(events_rx));

        tracing::info!(
            addr = %listener.local_addr()?,
            downstream = %self.config.downstream_addr,
            "Hub listening"
        );

        let finished = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                None
            }
            result = &mut dispatcher => Some(result),
            _ = self.accept_loop(&listener, &events_tx) => None,
        };

        let result = match finished {
            Some(result) => result,
            None => {
                // The dispatcher may already be gone, in which case its result
                // is still waiting in the join handle
                let _ = events_tx.send(HubEvent::Shutdown).await;
                dispatcher.await
            }
        };

        let stats = result??;
        tracing::info!(
            total_connections = stats.total_connections,
            uptime_secs = stats.uptime().as_secs(),
            "Hub stopped"
        );
        Ok(stats)
    }

    async fn accept_loop(&self, listener: &TcpListener, events: &mpsc::Sender<HubEvent>) {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr, events).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    async fn handle_connection(
        &self,
        socket: TcpStream,
        peer_addr: SocketAddr,
        events: &mpsc::Sender<HubEvent>,
    ) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let id = ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed));

        tracing::debug!(client_id = %id, peer = %peer_addr, "New connection");

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        connection::accept(
            id,
            socket,
            peer_addr,
            TransportSettings::from(&self.config),
            self.config.client_queue_capacity,
            events.clone(),
            permit,
        )
        .await;
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        Ok(())
    }

    /// Get the listen address
    pub fn listen_addr(&self) -> SocketAddr {
        self.config.listen_addr
    }
}
