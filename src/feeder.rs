//! The line feeder: reads lines from any `BufRead` and turns them into
//! [`Item`] values for the first stage's inbox.

use std::io::BufRead;

use crate::item::{Item, SENTINEL};

/// Maximum line length in bytes, matching a 1024-character `fgets` buffer
/// convention (1024 characters plus the trailing `\0` the buffer needs).
/// Lines longer than this are truncated to their first `MAX_LINE_LEN` bytes
/// rather than rejected, matching `fgets`'s behavior of silently filling the
/// buffer and leaving the rest for the next read.
pub const MAX_LINE_LEN: usize = 1024;

/// Reads one line at a time, up to [`MAX_LINE_LEN`] bytes, with the trailing
/// newline (and a preceding `\r`, for CRLF input) stripped. Stops at EOF or
/// at the sentinel line.
pub struct Feeder<R> {
    reader: R,
}

impl<R: BufRead> Feeder<R> {
    /// Wraps any buffered reader (typically `io::stdin().lock()`).
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads the next line as an [`Item`], or `None` at end-of-stream.
    /// Returns `Ok(Some(Item::Done))` exactly once, for the line equal to
    /// [`SENTINEL`]; callers should stop reading after that point, matching
    /// "back-to-back `<END>` is accepted; the first terminates; subsequent
    /// lines are not read".
    pub fn next_item(&mut self) -> std::io::Result<Option<Item>> {
        let mut buf = String::new();
        let bytes_read = self.reader.read_line(&mut buf)?;
        if bytes_read == 0 {
            return Ok(None);
        }

        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        if buf.len() > MAX_LINE_LEN {
            let mut boundary = MAX_LINE_LEN;
            while boundary > 0 && !buf.is_char_boundary(boundary) {
                boundary -= 1;
            }
            buf.truncate(boundary);
        }

        if is_sentinel(&buf) {
            return Ok(Some(Item::Done));
        }
        Ok(Some(Item::Payload(buf)))
    }
}

/// Whether `line` is the sentinel, for callers that need the raw string
/// rather than the converted [`Item`]. Used by [`Feeder::next_item`] and by
/// [`crate::pipeline::Pipeline::feed_line`].
pub fn is_sentinel(line: &str) -> bool {
    line == SENTINEL
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn strips_trailing_newline() {
        let mut feeder = Feeder::new(Cursor::new(b"hello\nworld\n".to_vec()));
        assert_eq!(
            feeder.next_item().unwrap(),
            Some(Item::Payload("hello".into()))
        );
        assert_eq!(
            feeder.next_item().unwrap(),
            Some(Item::Payload("world".into()))
        );
        assert_eq!(feeder.next_item().unwrap(), None);
    }

    #[test]
    fn strips_crlf() {
        let mut feeder = Feeder::new(Cursor::new(b"hello\r\n".to_vec()));
        assert_eq!(
            feeder.next_item().unwrap(),
            Some(Item::Payload("hello".into()))
        );
    }

    #[test]
    fn preserves_empty_lines() {
        let mut feeder = Feeder::new(Cursor::new(b"\nx\n".to_vec()));
        assert_eq!(
            feeder.next_item().unwrap(),
            Some(Item::Payload(String::new()))
        );
        assert_eq!(feeder.next_item().unwrap(), Some(Item::Payload("x".into())));
    }

    #[test]
    fn recognizes_sentinel() {
        let mut feeder = Feeder::new(Cursor::new(b"<END>\nnever read\n".to_vec()));
        assert_eq!(feeder.next_item().unwrap(), Some(Item::Done));
    }

    #[test]
    fn truncates_overlong_lines() {
        let long = "a".repeat(MAX_LINE_LEN + 50);
        let mut feeder = Feeder::new(Cursor::new(format!("{long}\n").into_bytes()));
        match feeder.next_item().unwrap() {
            Some(Item::Payload(s)) => assert_eq!(s.len(), MAX_LINE_LEN),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
