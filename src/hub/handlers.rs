//! Locally served requests
//!
//! Each handler is a pure function of the playlist and the request. It
//! returns an [`Outcome`] describing who should hear about the result; the
//! dispatcher does the actual sending.
//!
//! | verb      | args                      | success broadcast           |
//! |-----------|---------------------------|-----------------------------|
//! | `enqueue` | `index hash type data`    | `ENQUEUE index hash type data` |
//! | `dequeue` | `index hash`              | `DEQUEUE index hash`        |
//! | `select`  | `index hash` or nothing   | `SELECT index hash` / `SELECT` |
//! | `list`    | none                      | (reply only) `COUNT`, `ITEM`... |
//!
//! `load` and `eject` are reserved: the hub sends them to the playout service
//! itself and refuses them from clients.

use std::fmt;

use crate::playlist::{ItemType, Playlist, PlaylistItem};
use crate::protocol::constants::{request, response, ACK_FAIL, ACK_WHAT};
use crate::protocol::Message;

use super::error::{CommandError, RequestError};

/// Messages produced by handling one event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Broadcast the triggering line exactly as received
    pub relay: bool,
    /// Sent to every client
    pub broadcast: Vec<Message>,
    /// Sent to the requesting client only
    pub reply: Vec<Message>,
    /// Sent to the playout service
    pub downstream: Vec<Message>,
}

impl Outcome {
    /// Relay the triggering line to every client
    pub fn relay() -> Self {
        Self {
            relay: true,
            ..Self::default()
        }
    }

    pub fn broadcast(message: Message) -> Self {
        Self {
            broadcast: vec![message],
            ..Self::default()
        }
    }

    pub fn reply(messages: Vec<Message>) -> Self {
        Self {
            reply: messages,
            ..Self::default()
        }
    }

    /// Append another outcome's messages to this one
    pub fn merge(&mut self, other: Outcome) {
        self.relay |= other.relay;
        self.broadcast.extend(other.broadcast);
        self.reply.extend(other.reply);
        self.downstream.extend(other.downstream);
    }

    /// Whether nothing needs sending
    pub fn is_empty(&self) -> bool {
        !self.relay && self.broadcast.is_empty() && self.reply.is_empty() && self.downstream.is_empty()
    }
}

/// Build `ACK <kind> <reason> <request words...>`
pub fn ack(kind: &str, reason: impl fmt::Display, request: &Message) -> Message {
    Message::new(response::ACK)
        .arg(kind)
        .arg(reason.to_string())
        .args_from(request.words().iter().cloned())
}

/// Requests the hub serves itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCommand {
    Enqueue,
    Dequeue,
    Select,
    List,
    Load,
    Eject,
}

impl LocalCommand {
    /// Look up a verb; `None` means the request is forwarded
    pub fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            request::ENQUEUE => Some(LocalCommand::Enqueue),
            request::DEQUEUE => Some(LocalCommand::Dequeue),
            request::SELECT => Some(LocalCommand::Select),
            request::LIST => Some(LocalCommand::List),
            request::LOAD => Some(LocalCommand::Load),
            request::EJECT => Some(LocalCommand::Eject),
            _ => None,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            LocalCommand::Enqueue => request::ENQUEUE,
            LocalCommand::Dequeue => request::DEQUEUE,
            LocalCommand::Select => request::SELECT,
            LocalCommand::List => request::LIST,
            LocalCommand::Load => request::LOAD,
            LocalCommand::Eject => request::EJECT,
        }
    }

    /// Whether `argc` arguments is a valid shape for this command
    ///
    /// Reserved verbs take any shape; they are refused regardless.
    pub fn accepts(self, argc: usize) -> bool {
        match self {
            LocalCommand::Enqueue => argc == 4,
            LocalCommand::Dequeue => argc == 2,
            LocalCommand::Select => argc == 0 || argc == 2,
            LocalCommand::List => argc == 0,
            LocalCommand::Load | LocalCommand::Eject => true,
        }
    }

    /// Run the command, turning failures into an `ACK` for the requester
    pub fn handle(self, playlist: &mut Playlist, request: &Message) -> Outcome {
        match self.execute(playlist, request) {
            Ok(outcome) => outcome,
            Err(CommandError::Invalid(e)) => Outcome::reply(vec![ack(ACK_WHAT, e, request)]),
            Err(CommandError::Failed(e)) => Outcome::reply(vec![ack(ACK_FAIL, e, request)]),
        }
    }

    fn execute(self, playlist: &mut Playlist, request: &Message) -> Result<Outcome, CommandError> {
        let args = request.args();
        if !self.accepts(args.len()) {
            return Err(RequestError::WrongArity {
                verb: self.verb(),
                got: args.len(),
            }
            .into());
        }

        match self {
            LocalCommand::Enqueue => enqueue(playlist, args),
            LocalCommand::Dequeue => dequeue(playlist, args),
            LocalCommand::Select => select(playlist, args),
            LocalCommand::List => Ok(list(playlist)),
            LocalCommand::Load | LocalCommand::Eject => {
                Err(RequestError::Reserved(self.verb()).into())
            }
        }
    }
}

fn parse_index(word: &str) -> Result<i64, RequestError> {
    word.parse()
        .map_err(|_| RequestError::InvalidIndex(word.to_string()))
}

fn enqueue(playlist: &mut Playlist, args: &[String]) -> Result<Outcome, CommandError> {
    let index = parse_index(&args[0])?;
    let item_type =
        ItemType::parse(&args[2]).ok_or_else(|| RequestError::InvalidItemType(args[2].clone()))?;
    let item = PlaylistItem::new(args[3].as_str(), args[1].as_str(), item_type);

    let index = playlist.enqueue(index, item)?;
    let item = &playlist.items()[index];

    Ok(Outcome::broadcast(
        Message::new(response::ENQUEUE)
            .arg(index.to_string())
            .arg(item.hash.as_str())
            .arg(item.item_type.as_str())
            .arg(item.data.as_str()),
    ))
}

fn dequeue(playlist: &mut Playlist, args: &[String]) -> Result<Outcome, CommandError> {
    let index = parse_index(&args[0])?;
    let had_selection = playlist.has_selection();

    let (index, hash) = playlist.dequeue(index, &args[1])?;
    let mut outcome = Outcome::broadcast(
        Message::new(response::DEQUEUE)
            .arg(index.to_string())
            .arg(hash),
    );

    // Removing the selected item clears the selection
    if had_selection && !playlist.has_selection() {
        outcome.merge(selection_outcome(playlist));
    }

    Ok(outcome)
}

fn select(playlist: &mut Playlist, args: &[String]) -> Result<Outcome, CommandError> {
    if args.is_empty() {
        playlist.deselect()?;
    } else {
        let index = parse_index(&args[0])?;
        playlist.select(index, &args[1])?;
    }

    Ok(selection_outcome(playlist))
}

fn list(playlist: &Playlist) -> Outcome {
    Outcome::reply(playlist.list().map(|record| record.to_message()).collect())
}

/// Announce the current selection and bring the playout service in line
///
/// A selected file is loaded; anything else ejects.
pub(crate) fn selection_outcome(playlist: &Playlist) -> Outcome {
    match playlist.selected() {
        Some((index, item)) => Outcome {
            broadcast: vec![Message::new(response::SELECT)
                .arg(index.to_string())
                .arg(item.hash.as_str())],
            downstream: vec![if item.is_file() {
                Message::new(request::LOAD).arg(item.data.as_str())
            } else {
                Message::new(request::EJECT)
            }],
            ..Outcome::default()
        },
        None => Outcome {
            broadcast: vec![Message::new(response::SELECT)],
            downstream: vec![Message::new(request::EJECT)],
            ..Outcome::default()
        },
    }
}
