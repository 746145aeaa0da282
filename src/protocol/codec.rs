//! Line tokeniser
//!
//! Turns a byte stream into messages, one per line. Tokenising is
//! incremental: state survives across reads, so a line (or a quoted word)
//! split over several TCP segments is reassembled.
//!
//! Rules:
//! - unquoted spaces, tabs and carriage returns separate words
//! - an unquoted newline ends the line
//! - `'...'` is taken literally
//! - `"..."` allows backslash escapes
//! - outside quotes a backslash escapes the next byte
//!
//! Every produced [`Frame`] keeps the raw bytes of its line so requests that
//! the hub does not handle can be forwarded exactly as received.

use std::mem;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;

use super::constants::DEFAULT_MAX_LINE_LENGTH;
use super::message::Message;

/// A tokenised line together with its raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Parsed message
    pub message: Message,
    /// The line as received, including the trailing newline
    pub raw: Bytes,
}

impl Frame {
    /// Build a frame from a message, using its packed form as the raw line
    pub fn from_message(message: Message) -> Self {
        let raw = message.pack();
        Self { message, raw }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Incremental tokeniser
#[derive(Debug)]
pub struct Tokeniser {
    max_line_length: usize,
    quote: Quote,
    escaping: bool,
    in_word: bool,
    word: Vec<u8>,
    words: Vec<String>,
    raw: BytesMut,
    invalid_utf8: bool,
    overflowed: bool,
}

impl Tokeniser {
    /// Create a tokeniser with the default line limit
    pub fn new() -> Self {
        Self::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Create a tokeniser that discards lines longer than `max_line_length` bytes
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            max_line_length: max_line_length.max(1),
            quote: Quote::None,
            escaping: false,
            in_word: false,
            word: Vec::new(),
            words: Vec::new(),
            raw: BytesMut::new(),
            invalid_utf8: false,
            overflowed: false,
        }
    }

    /// Consume bytes from `buf` until one line is complete
    ///
    /// Returns `None` once `buf` is exhausted without completing a line; the
    /// partial line is kept internally. Blank lines are skipped.
    pub fn next_frame(&mut self, buf: &mut BytesMut) -> Option<Result<Frame, ProtocolError>> {
        let mut pos = 0;
        let mut found = None;

        while pos < buf.len() {
            let byte = buf[pos];
            pos += 1;

            if self.push(byte) {
                if let Some(result) = self.finish_line() {
                    found = Some(result);
                    break;
                }
            }
        }

        buf.advance(pos);
        found
    }

    /// Drain every complete line currently in `buf`
    pub fn tokenise(&mut self, buf: &mut BytesMut) -> Vec<Result<Frame, ProtocolError>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame(buf) {
            frames.push(frame);
        }
        frames
    }

    /// Whether a line is partially buffered
    pub fn has_partial_line(&self) -> bool {
        !self.raw.is_empty() || self.overflowed
    }

    /// Feed one byte. Returns true at an unquoted newline.
    fn push(&mut self, byte: u8) -> bool {
        self.record_raw(byte);

        if self.escaping {
            self.escaping = false;
            self.push_literal(byte);
            return false;
        }

        match self.quote {
            Quote::Single => {
                if byte == b'\'' {
                    self.quote = Quote::None;
                } else {
                    self.push_literal(byte);
                }
            }
            Quote::Double => match byte {
                b'"' => self.quote = Quote::None,
                b'\\' => self.escaping = true,
                _ => self.push_literal(byte),
            },
            Quote::None => match byte {
                b'\n' => return true,
                b' ' | b'\t' | b'\r' => self.end_word(),
                b'\'' => {
                    self.quote = Quote::Single;
                    self.in_word = true;
                }
                b'"' => {
                    self.quote = Quote::Double;
                    self.in_word = true;
                }
                b'\\' => {
                    self.escaping = true;
                    self.in_word = true;
                }
                _ => self.push_literal(byte),
            },
        }

        false
    }

    fn record_raw(&mut self, byte: u8) {
        if self.overflowed {
            return;
        }
        if self.raw.len() >= self.max_line_length {
            // Keep scanning for the end of the line, but stop storing it
            self.overflowed = true;
            self.raw.clear();
            self.word.clear();
            self.words.clear();
            return;
        }
        self.raw.put_u8(byte);
    }

    fn push_literal(&mut self, byte: u8) {
        self.in_word = true;
        if !self.overflowed {
            self.word.push(byte);
        }
    }

    fn end_word(&mut self) {
        if !self.in_word {
            return;
        }
        self.in_word = false;

        let bytes = mem::take(&mut self.word);
        if self.overflowed {
            return;
        }
        match String::from_utf8(bytes) {
            Ok(word) => self.words.push(word),
            Err(_) => self.invalid_utf8 = true,
        }
    }

    fn finish_line(&mut self) -> Option<Result<Frame, ProtocolError>> {
        self.end_word();

        let raw = self.raw.split().freeze();
        let words = mem::take(&mut self.words);
        let overflowed = mem::replace(&mut self.overflowed, false);
        let invalid_utf8 = mem::replace(&mut self.invalid_utf8, false);

        if overflowed {
            return Some(Err(ProtocolError::LineTooLong {
                limit: self.max_line_length,
            }));
        }
        if invalid_utf8 {
            return Some(Err(ProtocolError::InvalidUtf8));
        }

        Message::from_words(words).map(|message| Ok(Frame { message, raw }))
    }
}

impl Default for Tokeniser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(frame: &Frame) -> Vec<&str> {
        frame.message.words().iter().map(String::as_str).collect()
    }

    fn single(input: &[u8]) -> Frame {
        let mut tok = Tokeniser::new();
        let mut buf = BytesMut::from(input);
        tok.next_frame(&mut buf).unwrap().unwrap()
    }

    #[test]
    fn test_simple_line() {
        let frame = single(b"enqueue 0 h1 file a.mp3\n");
        assert_eq!(words(&frame), ["enqueue", "0", "h1", "file", "a.mp3"]);
        assert_eq!(&frame.raw[..], b"enqueue 0 h1 file a.mp3\n");
    }

    #[test]
    fn test_quoting_rules() {
        let frame = single(b"load 'my file.mp3' \"say \\\"hi\\\"\" a\\ b ''\n");
        assert_eq!(words(&frame), ["load", "my file.mp3", "say \"hi\"", "a b", ""]);
    }

    #[test]
    fn test_crlf_and_extra_whitespace() {
        let frame = single(b"  list \t \r\n");
        assert_eq!(words(&frame), ["list"]);
    }

    #[test]
    fn test_quoted_newline_does_not_end_line() {
        let frame = single(b"enqueue 0 h text 'two\nlines'\n");
        assert_eq!(frame.message.args()[3], "two\nlines");
    }

    #[test]
    fn test_partial_reads() {
        let mut tok = Tokeniser::new();
        let mut buf = BytesMut::from(&b"select 1 'ab"[..]);

        assert!(tok.next_frame(&mut buf).is_none());
        assert!(buf.is_empty());
        assert!(tok.has_partial_line());

        buf.extend_from_slice(b"c d'\nlist\n");
        let first = tok.next_frame(&mut buf).unwrap().unwrap();
        assert_eq!(words(&first), ["select", "1", "abc d"]);
        assert_eq!(&first.raw[..], b"select 1 'abc d'\n");

        let second = tok.next_frame(&mut buf).unwrap().unwrap();
        assert_eq!(words(&second), ["list"]);
        assert!(!tok.has_partial_line());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut tok = Tokeniser::new();
        let mut buf = BytesMut::from(&b"\n\n   \nlist\n"[..]);
        let frames = tok.tokenise(&mut buf);
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_invalid_utf8_reported_and_recovered() {
        let mut tok = Tokeniser::new();
        let mut buf = BytesMut::from(&b"load \xff\xfe\nlist\n"[..]);
        let frames = tok.tokenise(&mut buf);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], Err(ProtocolError::InvalidUtf8));
        assert!(frames[1].is_ok());
    }

    #[test]
    fn test_line_too_long_discarded() {
        let mut tok = Tokeniser::with_max_line_length(8);
        let mut buf = BytesMut::from(&b"enqueue 0 hash file x\nlist\n"[..]);
        let frames = tok.tokenise(&mut buf);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], Err(ProtocolError::LineTooLong { limit: 8 }));
        assert_eq!(words(frames[1].as_ref().unwrap()), ["list"]);
    }

    #[test]
    fn test_packed_message_tokenises_back() {
        let msg = Message::new("ITEM")
            .arg("0")
            .arg("h'1")
            .arg("text")
            .arg("Note: play \"more\" \\ less");
        let frame = single(&msg.pack());
        assert_eq!(frame.message, msg);
    }
}
