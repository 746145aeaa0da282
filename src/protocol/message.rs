//! Protocol messages
//!
//! A message is a non-empty list of words. The first word is the verb, the
//! rest are its arguments. Packing quotes any word the tokeniser would
//! otherwise split or interpret.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

/// A single protocol message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    words: Vec<String>,
}

impl Message {
    /// Create a message with only a verb
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            words: vec![verb.into()],
        }
    }

    /// Build a message from already-split words
    ///
    /// Returns `None` for an empty word list since a message needs a verb.
    pub fn from_words(words: Vec<String>) -> Option<Self> {
        if words.is_empty() {
            None
        } else {
            Some(Self { words })
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.words.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args_from<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words.extend(args.into_iter().map(Into::into));
        self
    }

    /// The verb (first word)
    pub fn verb(&self) -> &str {
        &self.words[0]
    }

    /// Arguments after the verb
    pub fn args(&self) -> &[String] {
        &self.words[1..]
    }

    /// All words including the verb
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Serialize to a newline-terminated line
    pub fn pack(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.packed_len_hint());
        self.pack_into(&mut buf);
        buf.freeze()
    }

    /// Append the newline-terminated line to `buf`
    pub fn pack_into(&self, buf: &mut BytesMut) {
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                buf.put_u8(b' ');
            }
            put_word(buf, word);
        }
        buf.put_u8(b'\n');
    }

    fn packed_len_hint(&self) -> usize {
        self.words.iter().map(|w| w.len() + 3).sum()
    }
}

/// Serialize several messages into one buffer, one line each
///
/// A multi-line response queued this way takes a single slot in a client's
/// outbound queue.
pub fn pack_all<'a, I>(messages: I) -> Bytes
where
    I: IntoIterator<Item = &'a Message>,
{
    let mut buf = BytesMut::new();
    for message in messages {
        buf.reserve(message.packed_len_hint());
        message.pack_into(&mut buf);
    }
    buf.freeze()
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let packed = self.pack();
        let line = String::from_utf8_lossy(&packed[..packed.len() - 1]);
        f.write_str(&line)
    }
}

fn needs_quoting(word: &str) -> bool {
    word.is_empty()
        || word
            .bytes()
            .any(|b| b.is_ascii_whitespace() || matches!(b, b'\'' | b'"' | b'\\'))
}

/// Write one word, single-quoting it when necessary.
///
/// Inside single quotes nothing is special except the closing quote, so an
/// embedded `'` is written as `'\''` (close, escaped quote, reopen).
fn put_word(buf: &mut BytesMut, word: &str) {
    if !needs_quoting(word) {
        buf.put_slice(word.as_bytes());
        return;
    }

    buf.put_u8(b'\'');
    for b in word.bytes() {
        if b == b'\'' {
            buf.put_slice(b"'\\''");
        } else {
            buf.put_u8(b);
        }
    }
    buf.put_u8(b'\'');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_and_args() {
        let msg = Message::new("enqueue").arg("0").arg("h1").arg("file").arg("a.mp3");

        assert_eq!(msg.verb(), "enqueue");
        assert_eq!(msg.args(), ["0", "h1", "file", "a.mp3"]);
        assert_eq!(msg.words().len(), 5);
    }

    #[test]
    fn test_from_words_rejects_empty() {
        assert!(Message::from_words(Vec::new()).is_none());
        assert!(Message::from_words(vec!["list".into()]).is_some());
    }

    #[test]
    fn test_pack_plain() {
        let msg = Message::new("DEQUEUE").arg("3").arg("abc");
        assert_eq!(&msg.pack()[..], b"DEQUEUE 3 abc\n");
    }

    #[test]
    fn test_pack_quotes_spaces_and_empty() {
        let msg = Message::new("ACK").arg("WHAT").arg("Bad command").arg("");
        assert_eq!(&msg.pack()[..], b"ACK WHAT 'Bad command' ''\n");
    }

    #[test]
    fn test_pack_escapes_single_quote() {
        let msg = Message::new("ITEM").arg("don't stop");
        assert_eq!(&msg.pack()[..], b"ITEM 'don'\\''t stop'\n");
    }

    #[test]
    fn test_pack_all_joins_lines() {
        let messages = [
            Message::new("COUNT").arg("1"),
            Message::new("ITEM").arg("0").arg("h1").arg("file").arg("a b.mp3"),
        ];

        assert_eq!(
            &pack_all(&messages)[..],
            b"COUNT 1\nITEM 0 h1 file 'a b.mp3'\n"
        );
        assert!(pack_all(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_display_has_no_newline() {
        let msg = Message::new("SELECT").arg("1").arg("h1");
        assert_eq!(msg.to_string(), "SELECT 1 h1");
    }
}
