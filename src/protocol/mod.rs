//! Wire protocol
//!
//! One message per line. A message is a list of words separated by
//! whitespace, with shell-like quoting; the first word is the verb.
//!
//! ```text
//!   client -> hub      enqueue 0 3f2a file '/music/a track.mp3'
//!   hub -> clients     ENQUEUE 0 3f2a file '/music/a track.mp3'
//!   client -> hub      play                       (forwarded as-is)
//!   playout -> hub     STATE Playing              (broadcast)
//! ```

pub mod codec;
pub mod constants;
pub mod features;
pub mod message;

pub use codec::{Frame, Tokeniser};
pub use features::{Feature, FeatureSet};
pub use message::{pack_all, Message};
