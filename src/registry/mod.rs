//! Client connection registry
//!
//! The registry tracks live client connections and fans messages out to
//! them. Each client has its own bounded queue drained by a writer task:
//!
//! ```text
//!                       ClientRegistry (dispatcher-owned)
//!                  ┌──────────────────────────────────┐
//!                  │ clients: HashMap<ClientId,       │
//!                  │   ClientHandle { tx, closer }    │
//!                  │ >                                │
//!                  └───────────────┬──────────────────┘
//!                                  │ broadcast(&Bytes)
//!          ┌───────────────────────┼───────────────────────┐
//!          ▼                       ▼                       ▼
//!    [mpsc queue]            [mpsc queue]            [mpsc queue]
//!    writer task             writer task             writer task
//!          │                       │                       │
//!          └──► TCP                └──► TCP                └──► TCP
//! ```
//!
//! # Zero-Copy Design
//!
//! Messages are packed once into `bytes::Bytes`; every queue holds a
//! reference-counted clone of the same buffer.
//!
//! # Slow clients
//!
//! Queues are bounded and the dispatcher never waits on them. A client whose
//! queue is full is reported back by [`ClientRegistry::broadcast`] and
//! disconnected by the dispatcher.

pub mod entry;
pub mod error;
pub mod store;

pub use entry::{ClientEnds, ClientHandle, ClientId};
pub use error::DeliveryError;
pub use store::ClientRegistry;
