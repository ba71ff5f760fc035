//! SD-file reader for molecule records
//!
//! This module splits multi-record SD streams and parses each record into a
//! typed [`ParsedRecord`](crate::app::models::ParsedRecord).
//!
//! ## Architecture
//!
//! - [`splitter`] - Splits a buffered stream on `$$$$` terminator lines
//! - [`record_parser`] - Parses one record block (header, counts, data items)
//! - [`field_parsers`] - Counts line and value classification helpers
//!
//! ## Usage
//!
//! ```rust
//! use sdf_extractor::app::services::sdf_parser::{RecordParser, RecordSplitter};
//!
//! # fn example() -> sdf_extractor::Result<()> {
//! let data = "Water\n\n\n  1  0  0  0  0  0  0  0  0  0999 V2000\n    0.0000    0.0000    0.0000 O   0  0\nM  END\n> <MW>\n18.015\n\n$$$$\n";
//! let parser = RecordParser::new()?;
//! let mut splitter = RecordSplitter::new(data.as_bytes());
//!
//! while let Some(raw) = splitter.next_record()? {
//!     match parser.parse(&raw.text) {
//!         Ok(record) => println!("{} has {} atoms", record.title, record.atom_count),
//!         Err(failure) => eprintln!("skipped: {}", failure),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod field_parsers;
pub mod record_parser;
pub mod splitter;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use record_parser::{ParseFailure, RecordParser};
pub use splitter::{RawRecord, RecordSplitter};
