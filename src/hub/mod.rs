//! The hub: dispatcher, request handlers and response routing
//!
//! Requests with a local verb are served from the playlist. Anything else is
//! forwarded to the playout service byte for byte, and its responses are
//! relayed to every client.
//!
//! ```text
//!   enqueue/dequeue/select/list ──► LocalCommand::handle ──► Outcome
//!   other verbs ──────────────────► playout service
//!   playout responses ────────────► route_response ──────► Outcome
//! ```

pub mod dispatcher;
pub mod error;
pub mod event;
pub mod handlers;
pub mod handshake;
pub mod responses;

pub use dispatcher::Hub;
pub use error::{CommandError, RequestError};
pub use event::{DisconnectReason, HubEvent};
pub use handlers::{LocalCommand, Outcome};
pub use handshake::{compose, HubIdentity};
pub use responses::route_response;
