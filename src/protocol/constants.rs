//! Protocol vocabulary
//!
//! Requests are lowercase words, responses are uppercase.

/// Request verbs
pub mod request {
    /// Insert an item into the playlist
    pub const ENQUEUE: &str = "enqueue";
    /// Remove an item from the playlist
    pub const DEQUEUE: &str = "dequeue";
    /// Select (or deselect) the active item
    pub const SELECT: &str = "select";
    /// Dump the playlist
    pub const LIST: &str = "list";
    /// Load a file on the playout service
    pub const LOAD: &str = "load";
    /// Unload the current file on the playout service
    pub const EJECT: &str = "eject";
}

/// Response verbs
pub mod response {
    /// Greeting, first message of every session
    pub const OHAI: &str = "OHAI";
    /// Feature advertisement, second message of every session
    pub const FEATURES: &str = "FEATURES";
    /// Request acknowledgement
    pub const ACK: &str = "ACK";
    /// An item was inserted
    pub const ENQUEUE: &str = "ENQUEUE";
    /// An item was removed
    pub const DEQUEUE: &str = "DEQUEUE";
    /// The selection changed
    pub const SELECT: &str = "SELECT";
    /// Playlist length, precedes the `ITEM` records of a listing
    pub const COUNT: &str = "COUNT";
    /// One playlist entry in a listing
    pub const ITEM: &str = "ITEM";
    /// Playback position report
    pub const TIME: &str = "TIME";
    /// Playback state report
    pub const STATE: &str = "STATE";
    /// The loaded file finished playing
    pub const END: &str = "END";
}

/// `ACK` subtype: request not understood
pub const ACK_WHAT: &str = "WHAT";
/// `ACK` subtype: request understood but failed
pub const ACK_FAIL: &str = "FAIL";

/// Item type word for playable files
pub const ITEM_TYPE_FILE: &str = "file";
/// Item type word for free-text entries
pub const ITEM_TYPE_TEXT: &str = "text";

/// Hub name used in the greeting
pub const DEFAULT_HUB_NAME: &str = "listd";

/// Default client-facing port
pub const DEFAULT_LISTEN_PORT: u16 = 1351;

/// Default port of the playout service
pub const DEFAULT_DOWNSTREAM_PORT: u16 = 1350;

/// Longest line accepted before it is discarded
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;
