//! TCP server: accept loop, client connections and configuration

pub mod config;
mod connection;
pub mod listener;

pub use config::HubConfig;
pub use listener::HubServer;
