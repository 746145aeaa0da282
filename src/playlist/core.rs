//! Playlist state machine
//!
//! An ordered list of items plus an optional selection. Four operations mutate
//! it (`enqueue`, `dequeue`, `select`/`deselect`, `advance`) and each keeps
//! the invariants:
//!
//! - hashes are pairwise distinct
//! - a selection, when present, indexes an existing item (a file item under
//!   [`SelectPolicy::FilesOnly`])
//! - inserting or removing at or before the selection shifts it so that it
//!   keeps pointing at the same item
//!
//! # Index bounds
//!
//! Client indices may be negative, counting from the end. Insertion resolves
//! against `len + 1` positions (so `len` and `-1` mean "append"), whereas
//! operations on an existing item resolve against `len`. The two cases are
//! the variants of [`IndexBound`].

use super::error::PlaylistError;
use super::item::PlaylistItem;
use super::listing::Listing;

/// Which positions an index may resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexBound {
    /// Any gap between items, including after the last one (`len + 1` positions)
    Insertion,
    /// An existing item (`len` positions)
    Existing,
}

impl IndexBound {
    /// Number of valid positions for a playlist of `len` items
    pub fn limit(self, len: usize) -> usize {
        match self {
            IndexBound::Insertion => len + 1,
            IndexBound::Existing => len,
        }
    }

    /// Resolve `index` against a playlist of `len` items
    pub fn resolve(self, index: i64, len: usize) -> Result<usize, PlaylistError> {
        resolve_index(index, self.limit(len))
    }
}

/// Resolve a possibly negative index against `length` positions
///
/// Negative indices count from the end (`-1` is `length - 1`).
pub fn resolve_index(index: i64, length: usize) -> Result<usize, PlaylistError> {
    let bound = i64::try_from(length).unwrap_or(i64::MAX);
    let resolved = if index < 0 { index + bound } else { index };

    if resolved < 0 || resolved >= bound {
        return Err(PlaylistError::IndexOutOfRange {
            index,
            bound: length,
        });
    }

    // In range of a usize length, so the conversion cannot fail
    usize::try_from(resolved).map_err(|_| PlaylistError::IndexOutOfRange {
        index,
        bound: length,
    })
}

/// Which items may be selected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectPolicy {
    /// Only file items; selecting a text item fails with `NotSelectable`
    #[default]
    FilesOnly,
    /// Any item
    AnyItem,
}

/// The shared playlist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    items: Vec<PlaylistItem>,
    selection: Option<usize>,
    policy: SelectPolicy,
}

impl Playlist {
    /// Create an empty playlist that only allows selecting files
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty playlist with the given selection policy
    pub fn with_policy(policy: SelectPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Selection policy in force
    pub fn policy(&self) -> SelectPolicy {
        self.policy
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the playlist has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in order
    pub fn items(&self) -> &[PlaylistItem] {
        &self.items
    }

    /// Item at a resolved index
    pub fn get(&self, index: usize) -> Option<&PlaylistItem> {
        self.items.get(index)
    }

    /// Current selection
    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    /// Whether something is selected
    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    /// The selected index and item
    pub fn selected(&self) -> Option<(usize, &PlaylistItem)> {
        let index = self.selection?;
        self.items.get(index).map(|item| (index, item))
    }

    /// Whether an item with this hash exists
    pub fn contains_hash(&self, hash: &str) -> bool {
        self.items.iter().any(|item| item.hash == hash)
    }

    /// Insert `item` at `index`, returning the resolved position
    pub fn enqueue(&mut self, index: i64, item: PlaylistItem) -> Result<usize, PlaylistError> {
        if self.contains_hash(&item.hash) {
            return Err(PlaylistError::DuplicateHash(item.hash));
        }

        let index = IndexBound::Insertion.resolve(index, self.items.len())?;
        self.items.insert(index, item);

        if let Some(selected) = self.selection {
            if index <= selected {
                self.selection = Some(selected + 1);
            }
        }

        Ok(index)
    }

    /// Remove the item at `index`, which must have hash `hash`
    ///
    /// Returns the resolved index and the removed item's hash.
    pub fn dequeue(&mut self, index: i64, hash: &str) -> Result<(usize, String), PlaylistError> {
        let index = IndexBound::Existing.resolve(index, self.items.len())?;
        self.check_hash(index, hash)?;

        let removed = self.items.remove(index);

        match self.selection {
            Some(selected) if index == selected => self.selection = None,
            Some(selected) if index < selected => self.selection = Some(selected - 1),
            _ => {}
        }

        Ok((index, removed.hash))
    }

    /// Select the item at `index`, which must have hash `hash`
    ///
    /// Returns the resolved index and the hash of the newly selected item.
    pub fn select(&mut self, index: i64, hash: &str) -> Result<(usize, String), PlaylistError> {
        let index = IndexBound::Existing.resolve(index, self.items.len())?;
        self.check_hash(index, hash)?;

        if self.policy == SelectPolicy::FilesOnly && !self.items[index].is_file() {
            return Err(PlaylistError::NotSelectable { index });
        }

        self.selection = Some(index);
        Ok((index, self.items[index].hash.clone()))
    }

    /// Clear the selection, returning the index that was selected
    pub fn deselect(&mut self) -> Result<usize, PlaylistError> {
        self.selection.take().ok_or(PlaylistError::NoSelection)
    }

    /// Move the selection to the next file item
    ///
    /// With no selection this does nothing and returns `false`. Otherwise the
    /// selection moves to the next file after it, or is cleared when there is
    /// none, and `true` is returned.
    pub fn advance(&mut self) -> bool {
        let Some(selected) = self.selection else {
            return false;
        };

        self.selection = self
            .items
            .iter()
            .enumerate()
            .skip(selected + 1)
            .find(|(_, item)| item.is_file())
            .map(|(index, _)| index);

        true
    }

    /// Snapshot listing: a count record followed by one record per item
    pub fn list(&self) -> Listing<'_> {
        Listing::new(&self.items)
    }

    fn check_hash(&self, index: usize, hash: &str) -> Result<(), PlaylistError> {
        let actual = &self.items[index].hash;
        if actual != hash {
            return Err(PlaylistError::HashMismatch {
                index,
                expected: hash.to_string(),
                actual: actual.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
impl Playlist {
    /// Build a playlist directly, bypassing the operations
    pub(crate) fn from_parts(items: Vec<PlaylistItem>, selection: Option<usize>) -> Self {
        Self {
            items,
            selection,
            policy: SelectPolicy::FilesOnly,
        }
    }
}
