//! Row building for parsed and failed records
//!
//! A [`RowBuilder`] fixes the success table layout once per build pass and
//! then maps each parsed record to one typed success row, or each failed
//! record to one failure row.

use std::sync::Arc;

use crate::app::models::{
    Cell, FailureRow, ParsedRecord, PropertyKind, PropertyValue, SuccessRow, TableSpec, TypedValue,
};
use crate::app::services::prediction::{PredictionTarget, Predictor};
use crate::app::services::sdf_parser::ParseFailure;
use crate::config::{PropertyRequest, ReaderConfig};
use crate::constants::{NO_ERROR_MESSAGE, ROW_KEY_PREFIX, columns};

/// Where the value of one success column comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource {
    RecordText,
    HeaderBlock,
    ConnectionTable,
    Title,
    AtomCount,
    BondCount,
    Property { name: String, kind: PropertyKind },
    SourceLocation,
    Prediction(PredictionTarget),
}

/// Maps records to output rows for a fixed column layout
pub struct RowBuilder {
    sources: Vec<ColumnSource>,
    success_spec: TableSpec,
    failure_spec: TableSpec,
    use_title_key: bool,
    include_source: bool,
    predictor: Option<Arc<dyn Predictor>>,
}

impl RowBuilder {
    /// Build the column layout from the options and the active property list
    ///
    /// Only requests selected for extraction become columns. Prediction
    /// columns are added when a predictor is supplied and a target is enabled.
    pub fn new(
        config: &ReaderConfig,
        properties: &[PropertyRequest],
        predictor: Option<Arc<dyn Predictor>>,
    ) -> Self {
        let mut sources = Vec::new();
        let mut success_spec = TableSpec::new();
        let mut add = |source: ColumnSource, name: &str, kind: PropertyKind| {
            success_spec.push_unique(name, kind);
            sources.push(source);
        };

        if config.extract_structure_block {
            add(ColumnSource::RecordText, columns::MOLECULE, PropertyKind::Text);
        }
        if config.extract_header_block {
            add(ColumnSource::HeaderBlock, columns::MOL_BLOCK, PropertyKind::Text);
        }
        if config.extract_connection_table {
            add(ColumnSource::ConnectionTable, columns::CTAB_BLOCK, PropertyKind::Text);
        }
        if config.extract_name {
            add(ColumnSource::Title, columns::MOLECULE_NAME, PropertyKind::Text);
        }
        if config.extract_atom_bond_counts {
            add(ColumnSource::AtomCount, columns::ATOM_COUNT, PropertyKind::Integer);
            add(ColumnSource::BondCount, columns::BOND_COUNT, PropertyKind::Integer);
        }
        for request in properties.iter().filter(|r| r.extract) {
            add(
                ColumnSource::Property {
                    name: request.name.clone(),
                    kind: request.kind,
                },
                &request.name,
                request.kind,
            );
        }
        if config.add_source_location_column {
            add(ColumnSource::SourceLocation, columns::SOURCE_LOCATION, PropertyKind::Text);
        }
        if predictor.is_some() {
            for target in PredictionTarget::enabled(config) {
                add(ColumnSource::Prediction(target), target.column_name(), target.kind());
            }
        }

        let mut failure_spec = TableSpec::new();
        failure_spec.push_unique(columns::FAILURE_RECORD, PropertyKind::Text);
        failure_spec.push_unique(columns::FAILURE_ERROR, PropertyKind::Text);
        if config.add_source_location_column {
            failure_spec.push_unique(columns::FAILURE_SOURCE, PropertyKind::Text);
        }

        Self {
            sources,
            success_spec,
            failure_spec,
            use_title_key: config.use_record_title_as_key,
            include_source: config.add_source_location_column,
            predictor,
        }
    }

    pub fn success_spec(&self) -> &TableSpec {
        &self.success_spec
    }

    pub fn failure_spec(&self) -> &TableSpec {
        &self.failure_spec
    }

    pub fn sources(&self) -> &[ColumnSource] {
        &self.sources
    }

    /// Build the success row for a parsed record
    ///
    /// `index` is the zero-based attempted-record index of the run.
    pub fn build(&self, record: &ParsedRecord, index: usize, source: &str) -> SuccessRow {
        let predictions = match &self.predictor {
            Some(predictor) if self.has_prediction_columns() => Some(predictor.predict(record)),
            _ => None,
        };

        let cells = self
            .sources
            .iter()
            .map(|column| match column {
                ColumnSource::RecordText => Cell::Text(record.record_text.clone()),
                ColumnSource::HeaderBlock => Cell::Text(record.structure_block.clone()),
                ColumnSource::ConnectionTable => Cell::Text(record.ctab_block.clone()),
                ColumnSource::Title => Cell::Text(record.title.clone()),
                ColumnSource::AtomCount => Cell::Integer(record.atom_count as i64),
                ColumnSource::BondCount => Cell::Integer(record.bond_count as i64),
                ColumnSource::Property { name, kind } => record
                    .property(name)
                    .map_or(Cell::Missing, |value| coerce(value, *kind)),
                ColumnSource::SourceLocation => Cell::Text(source.to_string()),
                ColumnSource::Prediction(target) => predictions
                    .as_ref()
                    .map_or(Cell::Missing, |p| p.cell(*target)),
            })
            .collect();

        let key = if self.use_title_key && !record.title.trim().is_empty() {
            record.title.clone()
        } else {
            row_key(index)
        };

        SuccessRow { key, cells }
    }

    /// Build the failure row for a record that could not be parsed
    pub fn build_failure(
        &self,
        raw_text: &str,
        failure: &ParseFailure,
        index: usize,
        source: &str,
    ) -> FailureRow {
        let error_message = if failure.message.trim().is_empty() {
            NO_ERROR_MESSAGE.to_string()
        } else {
            failure.to_string()
        };

        FailureRow {
            key: row_key(index),
            raw_text: raw_text.to_string(),
            error_message,
            source_location: self.include_source.then(|| source.to_string()),
        }
    }

    fn has_prediction_columns(&self) -> bool {
        self.sources
            .iter()
            .any(|s| matches!(s, ColumnSource::Prediction(_)))
    }
}

/// Sequential row key for an attempted-record index
pub fn row_key(index: usize) -> String {
    format!("{}{}", ROW_KEY_PREFIX, index)
}

/// Coerce a property value to a column kind
///
/// Text columns take the original text. Integer columns truncate float
/// values. Values that cannot be represented in the column kind become
/// missing cells.
pub fn coerce(value: &PropertyValue, kind: PropertyKind) -> Cell {
    let Some(typed) = value.value() else {
        return Cell::Missing;
    };

    match (kind, typed) {
        (PropertyKind::Text, _) => Cell::Text(value.raw().to_string()),
        (PropertyKind::Integer, TypedValue::Integer(v)) => Cell::Integer(*v),
        (PropertyKind::Integer, TypedValue::Float(v)) => Cell::Integer(v.trunc() as i64),
        (PropertyKind::Integer, TypedValue::Text(_)) => Cell::Missing,
        (PropertyKind::Float, TypedValue::Integer(v)) => Cell::Float(*v as f64),
        (PropertyKind::Float, TypedValue::Float(v)) => Cell::Float(*v),
        (PropertyKind::Float, TypedValue::Text(_)) => Cell::Missing,
    }
}
