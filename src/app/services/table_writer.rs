//! Table output for extracted molecules
//!
//! Converts the collected success and failure tables into polars data frames
//! and writes them as Parquet or CSV files. Every frame starts with a
//! `Row ID` column carrying the row keys; missing cells become nulls.

use std::fs::File;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use polars::prelude::{
    Column, CsvWriter, DataFrame, ParquetCompression, ParquetWriter, SerWriter,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::models::{Cell, PropertyKind, TableSpec};
use crate::app::services::pipeline::ExtractedTables;
use crate::constants::columns;
use crate::{Error, Result};

/// File format of written tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Snappy-compressed Parquet
    #[default]
    Parquet,
    /// Comma-separated text with a header line
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Paths and row counts of a completed write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenTables {
    pub success_path: PathBuf,
    pub success_rows: usize,
    pub failure_path: PathBuf,
    pub failure_rows: usize,
}

/// Writes a success table and its failure table side by side
#[derive(Debug, Clone)]
pub struct TableWriter {
    output_dir: PathBuf,
    stem: String,
    format: OutputFormat,
}

impl TableWriter {
    /// Writer producing `<stem>.<ext>` and `<stem>_failures.<ext>` in `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>, stem: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            stem: stem.into(),
            format,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn success_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.stem, self.format.extension()))
    }

    pub fn failure_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_failures.{}", self.stem, self.format.extension()))
    }

    /// Write both tables, creating the output directory when needed
    pub fn write(&self, tables: &ExtractedTables) -> Result<WrittenTables> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            Error::io(
                format!(
                    "Failed to create output directory '{}'",
                    self.output_dir.display()
                ),
                e,
            )
        })?;

        let mut successes = success_frame(tables)?;
        let mut failures = failure_frame(tables)?;

        let success_path = self.success_path();
        let failure_path = self.failure_path();
        self.write_frame(&mut successes, &success_path)?;
        self.write_frame(&mut failures, &failure_path)?;

        info!(
            "Wrote {} molecule(s) to {} and {} failure(s) to {}",
            successes.height(),
            success_path.display(),
            failures.height(),
            failure_path.display()
        );

        Ok(WrittenTables {
            success_rows: successes.height(),
            success_path,
            failure_rows: failures.height(),
            failure_path,
        })
    }

    fn write_frame(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        debug!(
            "Writing {} x {} frame to {}",
            df.height(),
            df.width(),
            path.display()
        );
        let file = File::create(path)
            .map_err(|e| Error::io(format!("Failed to create '{}'", path.display()), e))?;

        match self.format {
            OutputFormat::Parquet => {
                ParquetWriter::new(file)
                    .with_compression(ParquetCompression::Snappy)
                    .finish(df)
                    .map_err(|e| {
                        Error::table_writing(format!("Failed to write '{}'", path.display()), e)
                    })?;
            }
            OutputFormat::Csv => {
                CsvWriter::new(file)
                    .include_header(true)
                    .finish(df)
                    .map_err(|e| {
                        Error::table_writing(format!("Failed to write '{}'", path.display()), e)
                    })?;
            }
        }
        Ok(())
    }
}

/// Success table as a data frame, keyed by `Row ID`
pub fn success_frame(tables: &ExtractedTables) -> Result<DataFrame> {
    let keys: Vec<&str> = tables.successes.iter().map(|r| r.key.as_str()).collect();
    let rows: Vec<&[Cell]> = tables.successes.iter().map(|r| r.cells.as_slice()).collect();
    build_frame(&tables.success_spec, &keys, &rows)
}

/// Failure table as a data frame, keyed by `Row ID`
pub fn failure_frame(tables: &ExtractedTables) -> Result<DataFrame> {
    let keys: Vec<&str> = tables.failures.iter().map(|r| r.key.as_str()).collect();
    let cells: Vec<Vec<Cell>> = tables.failures.iter().map(|r| r.cells()).collect();
    let rows: Vec<&[Cell]> = cells.iter().map(Vec::as_slice).collect();
    build_frame(&tables.failure_spec, &keys, &rows)
}

fn build_frame(spec: &TableSpec, keys: &[&str], rows: &[&[Cell]]) -> Result<DataFrame> {
    // The key column claims its name first; a property called "Row ID" is renamed
    let mut names = TableSpec::new();
    names.push_unique(columns::ROW_ID, PropertyKind::Text);
    names.extend_unique(spec);

    let mut frame_columns = Vec::with_capacity(names.len());
    frame_columns.push(Column::new(names.columns[0].name.as_str().into(), keys.to_vec()));

    for (index, column) in names.columns.iter().skip(1).enumerate() {
        let cells = rows.iter().map(|row| row.get(index).unwrap_or(&Cell::Missing));
        frame_columns.push(build_column(&column.name, column.kind, cells));
    }

    DataFrame::new(frame_columns)
        .map_err(|e| Error::table_writing("Failed to assemble output table", e))
}

fn build_column<'a>(
    name: &str,
    kind: PropertyKind,
    cells: impl Iterator<Item = &'a Cell>,
) -> Column {
    match kind {
        PropertyKind::Integer => {
            let values: Vec<Option<i64>> = cells
                .map(|cell| match cell {
                    Cell::Integer(v) => Some(*v),
                    Cell::Float(v) => Some(v.trunc() as i64),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), values)
        }
        PropertyKind::Float => {
            let values: Vec<Option<f64>> = cells
                .map(|cell| match cell {
                    Cell::Integer(v) => Some(*v as f64),
                    Cell::Float(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), values)
        }
        PropertyKind::Text => {
            let values: Vec<Option<String>> = cells
                .map(|cell| (!cell.is_missing()).then(|| cell.to_string()))
                .collect();
            Column::new(name.into(), values)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{FailureRow, SuccessRow};
    use polars::prelude::AnyValue;

    fn sample_tables() -> ExtractedTables {
        let mut success_spec = TableSpec::new();
        success_spec.push_unique("Molecule name", PropertyKind::Text);
        success_spec.push_unique("Atom count", PropertyKind::Integer);
        success_spec.push_unique("LogD", PropertyKind::Float);

        let mut failure_spec = TableSpec::new();
        failure_spec.push_unique(columns::FAILURE_RECORD, PropertyKind::Text);
        failure_spec.push_unique(columns::FAILURE_ERROR, PropertyKind::Text);

        ExtractedTables {
            success_spec,
            successes: vec![
                SuccessRow {
                    key: "Row0".to_string(),
                    cells: vec![
                        Cell::Text("MolA".to_string()),
                        Cell::Integer(3),
                        Cell::Float(1.5),
                    ],
                },
                SuccessRow {
                    key: "Row2".to_string(),
                    cells: vec![Cell::Text("MolC".to_string()), Cell::Integer(1), Cell::Missing],
                },
            ],
            failure_spec,
            failures: vec![FailureRow {
                key: "Row1".to_string(),
                raw_text: "MolB\n".to_string(),
                error_message: "line 4: bad counts".to_string(),
                source_location: None,
            }],
        }
    }

    #[test]
    fn test_success_frame_layout() {
        let df = success_frame(&sample_tables()).unwrap();

        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["Row ID", "Molecule name", "Atom count", "LogD"]);
        assert_eq!(df.height(), 2);

        let logd = df.column("LogD").unwrap();
        assert_eq!(logd.null_count(), 1);
        assert_eq!(logd.get(0).unwrap(), AnyValue::Float64(1.5));

        let counts = df.column("Atom count").unwrap();
        assert_eq!(counts.get(1).unwrap(), AnyValue::Int64(1));
    }

    #[test]
    fn test_failure_frame_layout() {
        let df = failure_frame(&sample_tables()).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["Row ID", "SDF string", "Error"]);
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_row_id_property_is_renamed() {
        let mut tables = sample_tables();
        tables.success_spec = TableSpec::new();
        tables.success_spec.push_unique("Row ID", PropertyKind::Text);
        tables.successes = vec![SuccessRow {
            key: "Row0".to_string(),
            cells: vec![Cell::Text("x".to_string())],
        }];

        let df = success_frame(&tables).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["Row ID", "Row ID (#1)"]);
    }

    #[test]
    fn test_empty_tables_still_have_columns() {
        let mut tables = sample_tables();
        tables.successes.clear();
        tables.failures.clear();

        let df = success_frame(&tables).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 4);
    }

    #[test]
    fn test_output_paths() {
        let writer = TableWriter::new("/tmp/out", "molecules", OutputFormat::Csv);
        assert_eq!(writer.success_path(), PathBuf::from("/tmp/out/molecules.csv"));
        assert_eq!(
            writer.failure_path(),
            PathBuf::from("/tmp/out/molecules_failures.csv")
        );
    }
}
