//! Shared playlist
//!
//! The playlist is owned by the hub's dispatcher and only ever mutated from
//! there, so none of these types do any locking. Every operation either
//! succeeds completely or leaves the playlist untouched.

pub mod core;
pub mod error;
pub mod item;
pub mod listing;

pub use self::core::{resolve_index, IndexBound, Playlist, SelectPolicy};
pub use error::PlaylistError;
pub use item::{ItemType, PlaylistItem};
pub use listing::{ListRecord, Listing};
