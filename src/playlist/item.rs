//! Playlist items

use std::fmt;

use crate::protocol::constants::{ITEM_TYPE_FILE, ITEM_TYPE_TEXT};

/// Kind of playlist entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// A playable file; `data` is its path
    File,
    /// A free-text note; never loaded or selected
    Text,
}

impl ItemType {
    /// Parse the wire word (`file` or `text`)
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            ITEM_TYPE_FILE => Some(ItemType::File),
            ITEM_TYPE_TEXT => Some(ItemType::Text),
            _ => None,
        }
    }

    /// Wire word for this type
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::File => ITEM_TYPE_FILE,
            ItemType::Text => ITEM_TYPE_TEXT,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the playlist
///
/// `hash` is chosen by the client that enqueued the item and identifies it
/// for later `dequeue`/`select` requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItem {
    /// File path or note text
    pub data: String,
    /// Client-chosen identity, unique within the playlist
    pub hash: String,
    /// Entry kind
    pub item_type: ItemType,
}

impl PlaylistItem {
    /// Create a file item
    pub fn file(data: impl Into<String>, hash: impl Into<String>) -> Self {
        Self::new(data, hash, ItemType::File)
    }

    /// Create a text item
    pub fn text(data: impl Into<String>, hash: impl Into<String>) -> Self {
        Self::new(data, hash, ItemType::Text)
    }

    /// Create an item of the given type
    pub fn new(data: impl Into<String>, hash: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            data: data.into(),
            hash: hash.into(),
            item_type,
        }
    }

    /// Whether the item is a playable file
    pub fn is_file(&self) -> bool {
        self.item_type == ItemType::File
    }
}
