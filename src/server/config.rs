//! Hub configuration

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::downstream::ReconnectPolicy;
use crate::hub::HubIdentity;
use crate::playlist::SelectPolicy;
use crate::protocol::constants::*;

/// Hub configuration options
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Address clients connect to
    pub listen_addr: SocketAddr,

    /// Address of the playout service
    pub downstream_addr: SocketAddr,

    /// Name and version announced in the greeting
    pub identity: HubIdentity,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Application-level read buffer size
    pub read_buffer_size: usize,

    /// Longest accepted line; longer lines are dropped
    pub max_line_length: usize,

    /// Messages queued per client before it counts as slow
    pub client_queue_capacity: usize,

    /// Lines queued for the playout service
    pub downstream_queue_capacity: usize,

    /// Events queued for the dispatcher
    pub event_queue_capacity: usize,

    /// Longest a single socket write may take
    pub write_timeout: Duration,

    /// Only allow file items to be selected
    pub select_files_only: bool,

    /// Reconnection schedule for the playout service
    pub reconnect: ReconnectPolicy,

    /// Stats logging interval (zero disables periodic logging)
    pub stats_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_LISTEN_PORT)),
            downstream_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_DOWNSTREAM_PORT)),
            identity: HubIdentity::default(),
            max_connections: 0, // Unlimited
            tcp_nodelay: true,
            read_buffer_size: 8 * 1024,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            client_queue_capacity: 1024,
            downstream_queue_capacity: 1024,
            event_queue_capacity: 4096,
            write_timeout: Duration::from_secs(10),
            select_files_only: true,
            reconnect: ReconnectPolicy::default(),
            stats_interval: Duration::from_secs(60),
        }
    }
}

impl HubConfig {
    /// Create a new config with custom listen and playout addresses
    pub fn with_addrs(listen: SocketAddr, downstream: SocketAddr) -> Self {
        Self {
            listen_addr: listen,
            downstream_addr: downstream,
            ..Default::default()
        }
    }

    /// Set the listen address
    pub fn listen(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    /// Set the playout service address
    pub fn downstream(mut self, addr: SocketAddr) -> Self {
        self.downstream_addr = addr;
        self
    }

    /// Set the announced identity
    pub fn identity(mut self, identity: HubIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the per-client queue capacity
    pub fn client_queue_capacity(mut self, capacity: usize) -> Self {
        self.client_queue_capacity = capacity.max(1);
        self
    }

    /// Set the maximum line length
    pub fn max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length.max(1);
        self
    }

    /// Set the write timeout
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Choose whether text items may be selected
    pub fn select_files_only(mut self, files_only: bool) -> Self {
        self.select_files_only = files_only;
        self
    }

    /// Set the reconnection schedule
    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Set the stats logging interval
    pub fn stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    /// Selection policy for the playlist
    pub fn select_policy(&self) -> SelectPolicy {
        if self.select_files_only {
            SelectPolicy::FilesOnly
        } else {
            SelectPolicy::AnyItem
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();

        assert_eq!(config.listen_addr.port(), DEFAULT_LISTEN_PORT);
        assert_eq!(config.downstream_addr.port(), DEFAULT_DOWNSTREAM_PORT);
        assert_eq!(config.identity.name, DEFAULT_HUB_NAME);
        assert_eq!(config.max_connections, 0);
        assert!(config.tcp_nodelay);
        assert!(config.select_files_only);
        assert_eq!(config.select_policy(), SelectPolicy::FilesOnly);
    }

    #[test]
    fn test_with_addrs() {
        let listen: SocketAddr = "127.0.0.1:2351".parse().unwrap();
        let downstream: SocketAddr = "127.0.0.1:2350".parse().unwrap();
        let config = HubConfig::with_addrs(listen, downstream);

        assert_eq!(config.listen_addr, listen);
        assert_eq!(config.downstream_addr, downstream);
    }

    #[test]
    fn test_builder_queue_capacity_at_least_one() {
        let config = HubConfig::default().client_queue_capacity(0);

        assert_eq!(config.client_queue_capacity, 1);
    }

    #[test]
    fn test_builder_select_policy() {
        let config = HubConfig::default().select_files_only(false);

        assert_eq!(config.select_policy(), SelectPolicy::AnyItem);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:1351".parse().unwrap();
        let config = HubConfig::default()
            .listen(addr)
            .max_connections(50)
            .write_timeout(Duration::from_secs(2))
            .stats_interval(Duration::ZERO)
            .identity(HubIdentity::new("studio-hub", "1.0"))
            .reconnect(ReconnectPolicy::default().max_attempts(3));

        assert_eq!(config.listen_addr, addr);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.write_timeout, Duration::from_secs(2));
        assert!(config.stats_interval.is_zero());
        assert_eq!(config.identity.tag(), "studio-hub-1.0");
        assert_eq!(config.reconnect.max_attempts, 3);
    }
}
