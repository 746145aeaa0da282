//! Routing of playout service responses
//!
//! `OHAI` and `FEATURES` are absorbed into [`DownstreamState`] and feed the
//! hub's own handshake. Everything else is relayed to every client as
//! received; `TIME` and `STATE` are also remembered, and `END` moves the
//! playlist on to the next file.

use crate::downstream::DownstreamState;
use crate::playlist::Playlist;
use crate::protocol::constants::response;
use crate::protocol::{FeatureSet, Message};

use super::handlers::{selection_outcome, Outcome};

/// Apply a playout service response to hub state
pub fn route_response(
    state: &mut DownstreamState,
    playlist: &mut Playlist,
    message: &Message,
) -> Outcome {
    let args = message.args();

    match message.verb() {
        response::OHAI => {
            state.set_version(args.join(" "));
            Outcome::default()
        }
        response::FEATURES => {
            state.set_features(FeatureSet::from_args(args));
            Outcome::default()
        }
        response::TIME => {
            if let Some(time) = args.first() {
                state.observe_time(time.as_str());
            }
            Outcome::relay()
        }
        response::STATE => {
            if let Some(playback) = args.first() {
                state.observe_state(playback.as_str());
            }
            Outcome::relay()
        }
        response::END => {
            let mut outcome = Outcome::relay();
            if playlist.advance() {
                outcome.merge(selection_outcome(playlist));
            }
            outcome
        }
        _ => Outcome::relay(),
    }
}
