//! Config file loading
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:1351"
//!
//! [playout]
//! uri = "localhost:1350"
//!
//! [log]
//! level = "info"
//!
//! [hub]                      # optional tuning
//! client_queue_capacity = 1024
//! write_timeout_ms = 10000
//! select_files_only = true
//! ```

use std::fs;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::protocol::constants::{DEFAULT_DOWNSTREAM_PORT, DEFAULT_LISTEN_PORT};
use crate::server::HubConfig;

/// Contents of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerSection,
    pub playout: PlayoutSection,
    pub log: LogSection,
    pub hub: HubSection,
}

/// `[server]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Client-facing `host:port`
    pub listen: String,
    /// Connection cap (0 = unlimited)
    pub max_connections: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: format!("0.0.0.0:{}", DEFAULT_LISTEN_PORT),
            max_connections: 0,
        }
    }
}

/// `[playout]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayoutSection {
    /// `host:port` of the playout service
    pub uri: String,
}

impl Default for PlayoutSection {
    fn default() -> Self {
        Self {
            uri: format!("localhost:{}", DEFAULT_DOWNSTREAM_PORT),
        }
    }
}

/// `[log]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    /// Filter directive, e.g. `info` or `listd=debug`
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[hub]`: every key falls back to the [`HubConfig`] default
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HubSection {
    pub name: Option<String>,
    pub client_queue_capacity: Option<usize>,
    pub downstream_queue_capacity: Option<usize>,
    pub max_line_length: Option<usize>,
    pub write_timeout_ms: Option<u64>,
    pub select_files_only: Option<bool>,
    pub reconnect_initial_ms: Option<u64>,
    pub reconnect_max_ms: Option<u64>,
    pub reconnect_max_attempts: Option<u32>,
    pub stats_interval_secs: Option<u64>,
}

impl FileConfig {
    /// Read and parse a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve addresses and build the server configuration
    pub fn to_hub_config(&self) -> Result<HubConfig, ConfigError> {
        let mut config = HubConfig::with_addrs(
            resolve(&self.server.listen)?,
            resolve(&self.playout.uri)?,
        )
        .max_connections(self.server.max_connections);

        let hub = &self.hub;
        if let Some(name) = &hub.name {
            config.identity.name = name.clone();
        }
        if let Some(capacity) = hub.client_queue_capacity {
            config = config.client_queue_capacity(capacity);
        }
        if let Some(capacity) = hub.downstream_queue_capacity {
            config.downstream_queue_capacity = capacity.max(1);
        }
        if let Some(length) = hub.max_line_length {
            config = config.max_line_length(length);
        }
        if let Some(ms) = hub.write_timeout_ms {
            config = config.write_timeout(Duration::from_millis(ms));
        }
        if let Some(files_only) = hub.select_files_only {
            config = config.select_files_only(files_only);
        }
        if let Some(ms) = hub.reconnect_initial_ms {
            config.reconnect.initial_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = hub.reconnect_max_ms {
            config.reconnect.max_delay = Duration::from_millis(ms);
        }
        if let Some(attempts) = hub.reconnect_max_attempts {
            config.reconnect.max_attempts = attempts;
        }
        if let Some(secs) = hub.stats_interval_secs {
            config = config.stats_interval(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

/// Resolve `host:port`, taking the first address
fn resolve(value: &str) -> Result<SocketAddr, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidAddress {
        value: value.to_string(),
        reason,
    };

    value
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("no addresses found".to_string()))
}
