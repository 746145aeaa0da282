//! Connection registry implementation
//!
//! Owned by the dispatcher and never shared, so it needs no locking.

use std::collections::HashMap;

use bytes::Bytes;

use super::entry::{ClientHandle, ClientId};
use super::error::DeliveryError;

/// All live client connections
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<ClientId, ClientHandle>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client, returning any handle previously registered under its ID
    pub fn insert(&mut self, handle: ClientHandle) -> Option<ClientHandle> {
        self.clients.insert(handle.id(), handle)
    }

    /// Remove a client
    ///
    /// Dropping the returned handle closes the connection.
    pub fn remove(&mut self, id: ClientId) -> Option<ClientHandle> {
        self.clients.remove(&id)
    }

    /// Look up a client
    pub fn get(&self, id: ClientId) -> Option<&ClientHandle> {
        self.clients.get(&id)
    }

    /// Whether a client is registered
    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Number of clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no clients are connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Iterate over all clients
    pub fn iter(&self) -> impl Iterator<Item = &ClientHandle> {
        self.clients.values()
    }

    /// Queue data for one client
    pub fn send_to(&self, id: ClientId, data: Bytes) -> Result<(), DeliveryError> {
        match self.clients.get(&id) {
            Some(handle) => handle.send(data),
            None => Err(DeliveryError::Closed),
        }
    }

    /// Queue data for every client
    ///
    /// `Bytes` is reference counted, so every queue shares one allocation.
    /// Returns the clients that could not take the message; the caller decides
    /// what to do with them.
    pub fn broadcast(&self, data: &Bytes) -> Vec<(ClientId, DeliveryError)> {
        self.clients
            .values()
            .filter_map(|handle| handle.send(data.clone()).err().map(|err| (handle.id(), err)))
            .collect()
    }

    /// Remove every client, returning their handles
    pub fn drain(&mut self) -> Vec<ClientHandle> {
        self.clients.drain().map(|(_, handle)| handle).collect()
    }
}
