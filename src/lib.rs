//! listd: a playlist hub for line-protocol playout services
//!
//! The hub sits between any number of clients and one playout service. It
//! serves playlist commands itself, forwards everything else, and relays the
//! service's responses so every client sees the same state.
//!
//! ```text
//!   client ──┐                        ┌── playlist (enqueue/dequeue/select/list)
//!   client ──┼──► HubServer ──► Hub ──┤
//!   client ──┘        ▲               └── DownstreamLink ──► playout service
//!                     └──────── broadcasts ◄──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use listd::{HubConfig, HubServer};
//!
//! # async fn example() -> listd::Result<()> {
//! let config = HubConfig::with_addrs(
//!     "0.0.0.0:1351".parse().unwrap(),
//!     "127.0.0.1:1350".parse().unwrap(),
//! );
//! let server = HubServer::new(config);
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod downstream;
pub mod error;
pub mod hub;
pub mod playlist;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod stats;
mod transport;

pub use config::FileConfig;
pub use downstream::ReconnectPolicy;
pub use error::{Error, Result};
pub use hub::{Hub, HubIdentity};
pub use playlist::{ItemType, Playlist, PlaylistItem};
pub use server::{HubConfig, HubServer};
pub use stats::HubStats;
