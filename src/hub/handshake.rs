//! Connection greeting
//!
//! Every client gets two messages before anything else:
//!
//! ```text
//!   OHAI listd-0.1.0/playd-0.2.0
//!   FEATURES PlayStop Seek End Playlist PlaylistTextItems
//! ```
//!
//! The hub takes over file loading, so `FileLoad` is withdrawn from the
//! playout service's features and the playlist features are added.

use crate::downstream::DownstreamState;
use crate::protocol::constants::{response, DEFAULT_HUB_NAME};
use crate::protocol::{Feature, Message};

/// Name and version the hub announces itself with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubIdentity {
    pub name: String,
    pub version: String,
}

impl Default for HubIdentity {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_NAME, env!("CARGO_PKG_VERSION"))
    }
}

impl HubIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// `name-version`
    pub fn tag(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

/// Build the greeting and feature advertisement for a new client
pub fn compose(identity: &HubIdentity, downstream: &DownstreamState) -> (Message, Message) {
    let ident = match downstream.version() {
        Some(version) => format!("{}/{}", identity.tag(), version),
        None => identity.tag(),
    };
    let greeting = Message::new(response::OHAI).arg(ident);

    let mut features = downstream.features().clone();
    features.remove(&Feature::FileLoad);
    features.insert(Feature::Playlist);
    features.insert(Feature::PlaylistTextItems);

    (greeting, features.to_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FeatureSet;

    #[test]
    fn test_greeting_before_downstream_version() {
        let identity = HubIdentity::new("listd", "0.1.0");
        let (greeting, _) = compose(&identity, &DownstreamState::new());

        assert_eq!(greeting.words(), ["OHAI", "listd-0.1.0"]);
    }

    #[test]
    fn test_greeting_with_downstream_version() {
        let identity = HubIdentity::new("listd", "0.1.0");
        let mut state = DownstreamState::new();
        state.set_version("playd-0.2.0");

        let (greeting, _) = compose(&identity, &state);
        assert_eq!(greeting.words(), ["OHAI", "listd-0.1.0/playd-0.2.0"]);
    }

    #[test]
    fn test_features_replace_file_load() {
        let mut state = DownstreamState::new();
        state.set_features(FeatureSet::from_args(&["FileLoad", "PlayStop", "End"]));

        let (_, features) = compose(&HubIdentity::default(), &state);
        assert_eq!(features.verb(), "FEATURES");

        let advertised = FeatureSet::from_args(features.args());
        assert!(!advertised.contains(&Feature::FileLoad));
        assert!(advertised.contains(&Feature::PlayStop));
        assert!(advertised.contains(&Feature::End));
        assert!(advertised.contains(&Feature::Playlist));
        assert!(advertised.contains(&Feature::PlaylistTextItems));
        assert_eq!(advertised.len(), 4);
    }

    #[test]
    fn test_features_are_deterministic() {
        let mut a = DownstreamState::new();
        a.set_features(FeatureSet::from_args(&["Seek", "End", "Extra"]));
        let mut b = DownstreamState::new();
        b.set_features(FeatureSet::from_args(&["Extra", "Seek", "End"]));

        let identity = HubIdentity::default();
        assert_eq!(compose(&identity, &a).1, compose(&identity, &b).1);
    }
}
