//! The hub's single connection to the playout service

pub mod backoff;
pub mod link;
pub mod state;

pub use backoff::{Backoff, ReconnectPolicy};
pub use link::{DownstreamHandle, DownstreamLink};
pub use state::DownstreamState;
