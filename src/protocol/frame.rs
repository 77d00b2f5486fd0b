//! Line framing for the device log stream.
//!
//! The serial console delivers newline-terminated text in arbitrary
//! fragments:
//! ```text
//! read 1: "[00:00:12.301,000] <inf> battery_led: Batt"
//! read 2: "ery level: 45%\r\n[00:00:12.302,000] <inf> ..."
//! ```
//! [`LineFramer`] stitches the fragments back into whole lines.

use bytes::{Buf, BytesMut};

/// Line terminator byte.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Longest partial line kept before it is emitted without a terminator.
pub const MAX_LINE_LENGTH: usize = 4096;

/// Line framer that handles partial data.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: BytesMut,
}

impl LineFramer {
    /// Creates a new line framer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Feeds data into the framer and returns the lines it completed.
    ///
    /// The returned iterator is lazy; lines it does not consume stay buffered
    /// and come out of the next call.
    pub fn feed(&mut self, data: &[u8]) -> Lines<'_> {
        self.buffer.extend_from_slice(data);
        Lines { framer: self }
    }

    /// Attempts to take the next complete, non-empty line.
    ///
    /// Returns `None` if no complete line is buffered.
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let raw = if let Some(pos) = self.buffer.iter().position(|&b| b == LINE_TERMINATOR) {
                let raw = self.buffer.split_to(pos);
                self.buffer.advance(1);
                raw
            } else if self.buffer.len() > MAX_LINE_LENGTH {
                tracing::warn!(
                    "no line terminator in {} bytes, breaking line",
                    self.buffer.len()
                );
                self.buffer.split_to(MAX_LINE_LENGTH)
            } else {
                return None;
            };

            let line = decode_lossy(&raw);
            if !line.is_empty() {
                return Some(line);
            }
        }
    }

    /// Returns the number of bytes currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Iterator over the lines completed by a [`LineFramer::feed`] call.
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.framer.next_line()
    }
}

/// Decodes UTF-8, dropping invalid byte runs and trailing whitespace.
fn decode_lossy(raw: &[u8]) -> String {
    let mut line = String::with_capacity(raw.len());
    for chunk in raw.utf8_chunks() {
        line.push_str(chunk.valid());
        if !chunk.invalid().is_empty() {
            tracing::trace!("dropped {} undecodable bytes", chunk.invalid().len());
        }
    }
    line.truncate(line.trim_end().len());
    line
}
