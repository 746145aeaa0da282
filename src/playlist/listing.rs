//! Playlist listing
//!
//! `list` produces `COUNT n` followed by `n` `ITEM` records. [`Listing`] is a
//! lazy iterator over a borrowed snapshot; clone it (or call
//! [`Playlist::list`](super::Playlist::list) again) to start over.

use crate::protocol::constants::response;
use crate::protocol::Message;

use super::item::PlaylistItem;

/// One record of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListRecord<'a> {
    /// Number of items that follow
    Count(usize),
    /// An item and its index
    Item {
        /// Position in the playlist
        index: usize,
        /// The item
        item: &'a PlaylistItem,
    },
}

impl ListRecord<'_> {
    /// Render as a `COUNT` or `ITEM` message
    pub fn to_message(&self) -> Message {
        match *self {
            ListRecord::Count(count) => Message::new(response::COUNT).arg(count.to_string()),
            ListRecord::Item { index, item } => Message::new(response::ITEM)
                .arg(index.to_string())
                .arg(item.hash.as_str())
                .arg(item.item_type.as_str())
                .arg(item.data.as_str()),
        }
    }
}

/// Lazy listing of a playlist
#[derive(Debug, Clone)]
pub struct Listing<'a> {
    items: &'a [PlaylistItem],
    // None until the count record has been produced
    next: Option<usize>,
}

impl<'a> Listing<'a> {
    pub(super) fn new(items: &'a [PlaylistItem]) -> Self {
        Self { items, next: None }
    }
}

impl<'a> Iterator for Listing<'a> {
    type Item = ListRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next {
            None => {
                self.next = Some(0);
                Some(ListRecord::Count(self.items.len()))
            }
            Some(index) => {
                let item = self.items.get(index)?;
                self.next = Some(index + 1);
                Some(ListRecord::Item { index, item })
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            None => self.items.len() + 1,
            Some(index) => self.items.len().saturating_sub(index),
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Listing<'_> {}
