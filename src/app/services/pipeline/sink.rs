//! Output sinks receiving pipeline rows
//!
//! The pipeline announces both table layouts once and then pushes rows in
//! encounter order. Success and failure rows are two independent sequences.

use crate::Result;
use crate::app::models::{FailureRow, OutputRow, SuccessRow, TableSpec};

/// Destination for pipeline output
pub trait RowSink {
    /// Called once per build pass before any row
    fn begin(&mut self, success_spec: &TableSpec, failure_spec: &TableSpec) -> Result<()>;

    fn push(&mut self, row: OutputRow) -> Result<()>;
}

/// Success and failure tables collected in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedTables {
    pub success_spec: TableSpec,
    pub successes: Vec<SuccessRow>,
    pub failure_spec: TableSpec,
    pub failures: Vec<FailureRow>,
}

impl ExtractedTables {
    /// Index of a success column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.success_spec.columns.iter().position(|c| c.name == name)
    }
}

/// Sink that keeps every row in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    tables: ExtractedTables,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &ExtractedTables {
        &self.tables
    }

    pub fn into_tables(self) -> ExtractedTables {
        self.tables
    }
}

impl RowSink for CollectingSink {
    fn begin(&mut self, success_spec: &TableSpec, failure_spec: &TableSpec) -> Result<()> {
        self.tables = ExtractedTables {
            success_spec: success_spec.clone(),
            failure_spec: failure_spec.clone(),
            ..Default::default()
        };
        Ok(())
    }

    fn push(&mut self, row: OutputRow) -> Result<()> {
        match row {
            OutputRow::Success(row) => self.tables.successes.push(row),
            OutputRow::Failure(row) => self.tables.failures.push(row),
        }
        Ok(())
    }
}
