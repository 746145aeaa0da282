//! What the hub remembers about the playout service

use crate::protocol::FeatureSet;

/// Last known state of the playout service
///
/// Filled in from the service's own `OHAI`, `FEATURES`, `TIME` and `STATE`
/// responses. Only the dispatcher writes to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownstreamState {
    version: Option<String>,
    features: FeatureSet,
    last_time: Option<String>,
    last_state: Option<String>,
}

impl DownstreamState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Version string from the service's greeting, if one has arrived
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Record the service's version; an empty string counts as unknown
    pub fn set_version(&mut self, version: impl Into<String>) {
        let version = version.into();
        self.version = if version.is_empty() { None } else { Some(version) };
    }

    /// Features the service advertised
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Replace the advertised feature set
    pub fn set_features(&mut self, features: FeatureSet) {
        self.features = features;
    }

    /// Last reported playback position
    pub fn last_time(&self) -> Option<&str> {
        self.last_time.as_deref()
    }

    /// Last reported playback state
    pub fn last_state(&self) -> Option<&str> {
        self.last_state.as_deref()
    }

    pub fn observe_time(&mut self, time: impl Into<String>) {
        self.last_time = Some(time.into());
    }

    pub fn observe_state(&mut self, state: impl Into<String>) {
        self.last_state = Some(state.into());
    }

    /// Forget everything learned from the previous connection
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Feature;

    #[test]
    fn test_version() {
        let mut state = DownstreamState::new();
        assert_eq!(state.version(), None);

        state.set_version("playd-0.2.0");
        assert_eq!(state.version(), Some("playd-0.2.0"));

        state.set_version("");
        assert_eq!(state.version(), None);
    }

    #[test]
    fn test_observations_and_reset() {
        let mut state = DownstreamState::new();
        state.set_features(FeatureSet::from_args(&["FileLoad", "End"]));
        state.observe_time("1500000");
        state.observe_state("Playing");

        assert!(state.features().contains(&Feature::End));
        assert_eq!(state.last_time(), Some("1500000"));
        assert_eq!(state.last_state(), Some("Playing"));

        state.reset();
        assert_eq!(state, DownstreamState::default());
    }
}
