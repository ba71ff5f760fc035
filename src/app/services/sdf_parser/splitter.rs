//! Record splitting for multi-record SD streams
//!
//! [`RecordSplitter`] reads a buffered stream line by line and yields the text
//! between `$$$$` terminator lines. It counts every byte it consumes so the
//! pipeline can report progress against the input size.

use std::io::BufRead;

use crate::constants::RECORD_TERMINATOR;
use crate::{Error, Result};

/// One raw record as read from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Record text with original line endings, terminator line excluded
    pub text: String,

    /// Bytes consumed for this record, terminator line included
    pub bytes: u64,
}

/// Lazy, forward-only splitter over a buffered reader
pub struct RecordSplitter<R> {
    reader: R,
    bytes_read: u64,
    buffer: Vec<u8>,
    exhausted: bool,
}

impl<R: BufRead> RecordSplitter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            bytes_read: 0,
            buffer: Vec::with_capacity(128),
            exhausted: false,
        }
    }

    /// Total bytes consumed from the underlying reader so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Read the next record
    ///
    /// Blocks containing only whitespace are skipped. A final block without a
    /// terminator is still returned when it has content. I/O errors are
    /// returned as-is and leave the splitter exhausted.
    pub fn next_record(&mut self) -> Result<Option<RawRecord>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut text = String::new();
        let mut record_bytes = 0u64;

        loop {
            self.buffer.clear();
            let read = match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(n) => n,
                Err(e) => {
                    self.exhausted = true;
                    return Err(Error::io("Failed to read record data", e));
                }
            };

            if read == 0 {
                self.exhausted = true;
                return Ok(non_blank(text, record_bytes));
            }

            self.bytes_read += read as u64;
            record_bytes += read as u64;

            // Non-UTF-8 bytes are replaced rather than failing the whole stream
            let line = String::from_utf8_lossy(&self.buffer);
            if line.trim_end() == RECORD_TERMINATOR {
                if let Some(record) = non_blank(text, record_bytes) {
                    return Ok(Some(record));
                }
                text = String::new();
                record_bytes = 0;
                continue;
            }

            text.push_str(&line);
        }
    }
}

fn non_blank(text: String, bytes: u64) -> Option<RawRecord> {
    if text.trim().is_empty() {
        None
    } else {
        Some(RawRecord { text, bytes })
    }
}

impl<R: BufRead> Iterator for RecordSplitter<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
