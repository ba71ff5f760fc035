//! Data models for SD-file extraction
//!
//! This module contains the core data structures shared by the parser, the
//! schema inferencer and the pipeline: property kinds and values, parsed
//! records, output cells, rows and table specifications.

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Property Kinds and Values
// =============================================================================

/// Value kind of a property column
///
/// The variant order is the widening order: a kind can only ever be promoted
/// to a kind that compares greater than itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    Integer,
    Float,
    Text,
}

impl PropertyKind {
    /// Resolve two observed kinds to the narrowest kind representing both
    pub fn widen(self, other: PropertyKind) -> PropertyKind {
        self.max(other)
    }

    /// Stable lowercase name used in settings files and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKind::Integer => "integer",
            PropertyKind::Float => "float",
            PropertyKind::Text => "text",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(PropertyKind::Integer),
            "float" | "double" => Ok(PropertyKind::Float),
            "text" | "string" => Ok(PropertyKind::Text),
            other => Err(Error::configuration(format!(
                "Unknown property kind '{}' (expected integer, float or text)",
                other
            ))),
        }
    }
}

/// Concrete typed value of a property
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl TypedValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            TypedValue::Integer(_) => PropertyKind::Integer,
            TypedValue::Float(_) => PropertyKind::Float,
            TypedValue::Text(_) => PropertyKind::Text,
        }
    }
}

/// A property value as found in one record
///
/// Keeps the trimmed source text next to the classified value so text columns
/// can re-emit the literal exactly as written. An empty value carries no
/// concrete typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValue {
    value: Option<TypedValue>,
    raw: String,
}

impl PropertyValue {
    pub fn new(value: Option<TypedValue>, raw: impl Into<String>) -> Self {
        Self {
            value,
            raw: raw.into(),
        }
    }

    /// Classified value, `None` when the source text was empty
    pub fn value(&self) -> Option<&TypedValue> {
        self.value.as_ref()
    }

    /// Original (trimmed) text of the value
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Kind of the concrete value, if any
    pub fn kind(&self) -> Option<PropertyKind> {
        self.value.as_ref().map(TypedValue::kind)
    }
}

// =============================================================================
// Parsed Record
// =============================================================================

/// A fully parsed molecule record
///
/// Only constructed by the record parser; a record that fails any part of
/// parsing is never exposed in a partial state.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    /// First line of the record, verbatim (may be empty)
    pub title: String,

    /// Molfile block: header lines and connection table through `M  END`
    pub structure_block: String,

    /// Connection table: counts line through `M  END`
    pub ctab_block: String,

    pub atom_count: usize,
    pub bond_count: usize,

    /// Data items in first-seen order; a repeated name keeps its first
    /// position and takes the last value
    pub properties: IndexMap<String, PropertyValue>,

    /// The complete record text as read (terminator excluded)
    pub record_text: String,
}

impl ParsedRecord {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

// =============================================================================
// Output Cells, Rows and Table Specifications
// =============================================================================

/// One output cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Explicit missing marker, distinct from zero or empty text
    Missing,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => f.write_str("?"),
            Cell::Integer(v) => write!(f, "{}", v),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Text(v) => f.write_str(v),
        }
    }
}

/// Name and kind of one output column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: PropertyKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered column layout of an output table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, renaming it to `"<name> (#<n>)"` if the name is taken
    pub fn push_unique(&mut self, name: &str, kind: PropertyKind) -> &ColumnSpec {
        let mut candidate = name.to_string();
        let mut suffix = 1;
        while self.contains(&candidate) {
            candidate = format!("{} (#{})", name, suffix);
            suffix += 1;
        }
        self.columns.push(ColumnSpec::new(candidate, kind));
        &self.columns[self.columns.len() - 1]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Concatenate another spec, keeping names unique
    pub fn extend_unique(&mut self, other: &TableSpec) {
        for column in &other.columns {
            self.push_unique(&column.name, column.kind);
        }
    }
}

/// Row for a successfully parsed record
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessRow {
    pub key: String,
    pub cells: Vec<Cell>,
}

/// Row for a record that could not be parsed
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRow {
    pub key: String,
    pub raw_text: String,
    pub error_message: String,
    pub source_location: Option<String>,
}

impl FailureRow {
    /// Cells in failure table order
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = vec![
            Cell::Text(self.raw_text.clone()),
            Cell::Text(self.error_message.clone()),
        ];
        if let Some(source) = &self.source_location {
            cells.push(Cell::Text(source.clone()));
        }
        cells
    }
}

/// Exactly one of these is produced per attempted record
#[derive(Debug, Clone, PartialEq)]
pub enum OutputRow {
    Success(SuccessRow),
    Failure(FailureRow),
}
