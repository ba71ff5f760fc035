//! Individual SD record parsing
//!
//! Turns one raw record block into a [`ParsedRecord`]: title, molfile block,
//! connection table, atom/bond counts and the `> <name>` data items.

use indexmap::IndexMap;
use regex::Regex;
use tracing::trace;

use super::field_parsers::{CtabVersion, classify_value, parse_counts_line, parse_v3000_counts};
use crate::app::models::{ParsedRecord, PropertyValue};
use crate::constants::{COUNTS_LINE_INDEX, HEADER_LINE_COUNT, MOLFILE_END, V3000_COUNTS_PREFIX};
use crate::{Error, Result};

/// A record that could not be parsed
///
/// `line` is the 1-based line within the record where parsing stopped.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseFailure {
    pub line: usize,
    pub message: String,
}

impl ParseFailure {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Parser for single SD records
#[derive(Debug, Clone)]
pub struct RecordParser {
    data_header: Regex,
}

impl RecordParser {
    /// Create a new record parser
    pub fn new() -> Result<Self> {
        let data_header = Regex::new(r"^>.*?<([^<>]+)>").map_err(|e| {
            Error::configuration(format!("Failed to compile data header pattern: {}", e))
        })?;
        Ok(Self { data_header })
    }

    /// Parse one record block (terminator excluded)
    pub fn parse(&self, text: &str) -> std::result::Result<ParsedRecord, ParseFailure> {
        let lines: Vec<&str> = text.lines().collect();

        if lines.iter().all(|l| l.trim().is_empty()) {
            return Err(ParseFailure::new(1, "Empty record"));
        }

        let title = lines[0].to_string();

        let counts_line = lines.get(COUNTS_LINE_INDEX).ok_or_else(|| {
            ParseFailure::new(
                lines.len() + 1,
                format!(
                    "Missing counts line: record has only {} line(s), expected {} header lines and a counts line",
                    lines.len(),
                    HEADER_LINE_COUNT
                ),
            )
        })?;

        let counts = parse_counts_line(counts_line)
            .map_err(|message| ParseFailure::new(COUNTS_LINE_INDEX + 1, message))?;

        let (atom_count, bond_count, end_index) = match counts.version {
            CtabVersion::V2000 => {
                let table_end = (COUNTS_LINE_INDEX + 1)
                    .checked_add(counts.atoms)
                    .and_then(|end| end.checked_add(counts.bonds))
                    .ok_or_else(|| {
                        ParseFailure::new(
                            COUNTS_LINE_INDEX + 1,
                            format!(
                                "Atom and bond counts exceed record length: {} atom(s) and {} bond(s) declared",
                                counts.atoms, counts.bonds
                            ),
                        )
                    })?;
                if lines.len() < table_end {
                    return Err(ParseFailure::new(
                        lines.len() + 1,
                        format!(
                            "MOL block truncated: counts line declares {} atom(s) and {} bond(s) but the record ends after {} line(s)",
                            counts.atoms,
                            counts.bonds,
                            lines.len()
                        ),
                    ));
                }
                let end_index = find_molfile_end(&lines, table_end)?;
                (counts.atoms, counts.bonds, end_index)
            }
            CtabVersion::V3000 => {
                let end_index = find_molfile_end(&lines, COUNTS_LINE_INDEX + 1)?;
                let (index, line) = lines[COUNTS_LINE_INDEX + 1..end_index]
                    .iter()
                    .enumerate()
                    .find(|(_, l)| l.starts_with(V3000_COUNTS_PREFIX))
                    .map(|(i, l)| (COUNTS_LINE_INDEX + 1 + i, *l))
                    .ok_or_else(|| {
                        ParseFailure::new(
                            COUNTS_LINE_INDEX + 1,
                            "V3000 counts line declared but no 'M  V30 COUNTS' line found",
                        )
                    })?;
                let (atoms, bonds) =
                    parse_v3000_counts(line).map_err(|m| ParseFailure::new(index + 1, m))?;
                (atoms, bonds, end_index)
            }
        };

        let structure_block = join_block(&lines[..=end_index]);
        let ctab_block = join_block(&lines[COUNTS_LINE_INDEX..=end_index]);
        let properties = self.parse_data_items(&lines, end_index + 1)?;

        trace!(
            "Parsed record '{}' with {} atoms, {} bonds, {} properties",
            title,
            atom_count,
            bond_count,
            properties.len()
        );

        Ok(ParsedRecord {
            title,
            structure_block,
            ctab_block,
            atom_count,
            bond_count,
            properties,
            record_text: text.to_string(),
        })
    }

    /// Parse the `> <name>` data items following `M  END`
    ///
    /// Value lines run until a blank line or the next data header. Lines
    /// outside any data item are ignored.
    fn parse_data_items(
        &self,
        lines: &[&str],
        start: usize,
    ) -> std::result::Result<IndexMap<String, PropertyValue>, ParseFailure> {
        let mut properties = IndexMap::new();
        let mut index = start;

        while index < lines.len() {
            let line = lines[index];
            if !line.starts_with('>') {
                index += 1;
                continue;
            }

            let name = self
                .data_header
                .captures(line)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .ok_or_else(|| {
                    ParseFailure::new(
                        index + 1,
                        format!("Data header without a <name> field: '{}'", line.trim_end()),
                    )
                })?;
            index += 1;

            let mut value_lines = Vec::new();
            while index < lines.len() {
                let value_line = lines[index];
                if value_line.trim().is_empty() || self.data_header.is_match(value_line) {
                    break;
                }
                value_lines.push(value_line);
                index += 1;
            }

            // Insert keeps the first position of a repeated name
            properties.insert(name, classify_value(&value_lines.join("\n")));
        }

        Ok(properties)
    }
}

fn find_molfile_end(lines: &[&str], from: usize) -> std::result::Result<usize, ParseFailure> {
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, l)| l.trim_end() == MOLFILE_END)
        .map(|(i, _)| i)
        .ok_or_else(|| {
            ParseFailure::new(
                lines.len(),
                format!("Missing '{}' line closing the molfile block", MOLFILE_END),
            )
        })
}

fn join_block(lines: &[&str]) -> String {
    let mut block = lines.join("\n");
    block.push('\n');
    block
}
