//! Capability flags advertised with `FEATURES`

use std::collections::BTreeSet;
use std::fmt;

use super::constants::response;
use super::message::Message;

/// A protocol capability
///
/// Unknown flags from the playout service are kept verbatim so they can be
/// passed on to clients.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    /// Files can be loaded with `load`
    FileLoad,
    /// `play` and `stop`
    PlayStop,
    /// `seek`
    Seek,
    /// `end` and the `END` response
    End,
    /// Periodic `TIME` reports
    TimeReport,
    /// Playlist commands
    Playlist,
    /// Free-text playlist items
    PlaylistTextItems,
    /// Any flag this crate does not know about
    Other(String),
}

impl Feature {
    /// Parse a wire flag
    pub fn parse(word: &str) -> Self {
        match word {
            "FileLoad" => Feature::FileLoad,
            "PlayStop" => Feature::PlayStop,
            "Seek" => Feature::Seek,
            "End" => Feature::End,
            "TimeReport" => Feature::TimeReport,
            "Playlist" => Feature::Playlist,
            "PlaylistTextItems" => Feature::PlaylistTextItems,
            other => Feature::Other(other.to_string()),
        }
    }

    /// Wire name of the flag
    pub fn as_str(&self) -> &str {
        match self {
            Feature::FileLoad => "FileLoad",
            Feature::PlayStop => "PlayStop",
            Feature::Seek => "Seek",
            Feature::End => "End",
            Feature::TimeReport => "TimeReport",
            Feature::Playlist => "Playlist",
            Feature::PlaylistTextItems => "PlaylistTextItems",
            Feature::Other(name) => name,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered set of features
///
/// Ordering is fixed so the advertisement is the same for every client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet {
    features: BTreeSet<Feature>,
}

impl FeatureSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the arguments of a `FEATURES` message
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        args.iter().map(|a| Feature::parse(a.as_ref())).collect()
    }

    /// Add a feature
    pub fn insert(&mut self, feature: Feature) -> bool {
        self.features.insert(feature)
    }

    /// Remove a feature
    pub fn remove(&mut self, feature: &Feature) -> bool {
        self.features.remove(feature)
    }

    /// Check membership
    pub fn contains(&self, feature: &Feature) -> bool {
        self.features.contains(feature)
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate in advertisement order
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Render as a `FEATURES` message
    pub fn to_message(&self) -> Message {
        Message::new(response::FEATURES).args_from(self.iter().map(Feature::as_str))
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}
