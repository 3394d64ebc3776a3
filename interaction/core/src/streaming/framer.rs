//! Line Framer
//!
//! Reassembles newline-delimited records from arbitrarily split network
//! chunks.
//!
//! Bytes are buffered and only whole lines are decoded, so a multi-byte UTF-8
//! character split across two chunks is decoded correctly once its line is
//! complete. A trailing `\r` is stripped from each record, which makes CRLF
//! and LF framing equivalent.
//!
//! # Guarantees
//!
//! - A record is yielded exactly once, in wire order.
//! - The trailing partial record is retained across `feed` calls and returned
//!   by [`LineFramer::finish`] at end of body, so it is never dropped.
//! - Records left unconsumed in a [`Records`] iterator stay buffered and are
//!   yielded by the next call.

/// Minimum buffer capacity
const MIN_BUFFER_CAPACITY: usize = 4096;

/// Incremental newline framer
#[derive(Debug)]
pub struct LineFramer {
    buffer: Vec<u8>,
    /// Position where we've consumed up to
    read_pos: usize,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    /// Create an empty framer
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MIN_BUFFER_CAPACITY),
            read_pos: 0,
        }
    }

    /// Append a chunk and iterate the records it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Records<'_> {
        self.push(chunk);
        Records { framer: self }
    }

    /// Text convenience for [`LineFramer::feed`]
    pub fn feed_str(&mut self, chunk: &str) -> Records<'_> {
        self.feed(chunk.as_bytes())
    }

    /// Number of buffered bytes not yet yielded
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len() - self.read_pos
    }

    /// Take the trailing partial record at end of input
    ///
    /// Returns `None` when nothing (or only an empty line) is buffered.
    pub fn finish(&mut self) -> Option<String> {
        let rest = &self.buffer[self.read_pos..];
        let record = if rest.is_empty() {
            None
        } else {
            Some(decode_line(rest))
        };
        self.clear();
        record.filter(|r| !r.is_empty())
    }

    /// Discard all buffered data
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.read_pos = 0;
    }

    fn push(&mut self, data: &[u8]) {
        // Compact buffer if we've consumed a lot
        if self.read_pos > self.buffer.len() / 2 && self.read_pos > MIN_BUFFER_CAPACITY {
            self.buffer.drain(..self.read_pos);
            self.read_pos = 0;
        }
        self.buffer.extend_from_slice(data);
    }

    fn next_record(&mut self) -> Option<String> {
        let rest = &self.buffer[self.read_pos..];
        let newline = rest.iter().position(|&b| b == b'\n')?;
        let record = decode_line(&rest[..newline]);
        self.read_pos += newline + 1;

        if self.read_pos == self.buffer.len() {
            self.clear();
        }
        Some(record)
    }
}

fn decode_line(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// Complete records made available by one `feed` call
pub struct Records<'a> {
    framer: &'a mut LineFramer,
}

impl Iterator for Records<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.framer.next_record()
    }
}
