//! Rule-based permeability predictions
//!
//! Predictions are computed from four per-molecule descriptor values (ALogP,
//! TPSA, BCUT and Mannhold logP). Descriptor values come from a pluggable
//! [`DescriptorSource`]; the default source reads them from record
//! properties. The rules themselves live behind the [`Predictor`] trait so a
//! different model can replace them without touching the pipeline.

use crate::app::models::{Cell, ParsedRecord, PropertyKind, TypedValue};
use crate::app::services::sdf_parser::field_parsers::{atom_symbol_v2000, atom_symbol_v3000};
use crate::config::ReaderConfig;
use crate::constants::{COUNTS_LINE_INDEX, V3000_MARKER, columns, descriptor_properties};

// =============================================================================
// Prediction Targets
// =============================================================================

/// The four fixed prediction columns, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictionTarget {
    LogBBClass,
    LogPSClass,
    LogBBRegression,
    LogPSRegression,
}

impl PredictionTarget {
    pub const ALL: [PredictionTarget; 4] = [
        PredictionTarget::LogBBClass,
        PredictionTarget::LogPSClass,
        PredictionTarget::LogBBRegression,
        PredictionTarget::LogPSRegression,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            PredictionTarget::LogBBClass => columns::LOG_BB_CLASSIFY,
            PredictionTarget::LogPSClass => columns::LOG_PS_CLASSIFY,
            PredictionTarget::LogBBRegression => columns::LOG_BB_REGRESSION,
            PredictionTarget::LogPSRegression => columns::LOG_PS_REGRESSION,
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            PredictionTarget::LogBBRegression => PropertyKind::Float,
            _ => PropertyKind::Integer,
        }
    }

    /// Targets switched on in a configuration
    pub fn enabled(config: &ReaderConfig) -> Vec<PredictionTarget> {
        Self::ALL
            .into_iter()
            .filter(|target| match target {
                PredictionTarget::LogBBClass => config.predict_log_bb_class,
                PredictionTarget::LogPSClass => config.predict_log_ps_class,
                PredictionTarget::LogBBRegression => config.predict_log_bb_regression,
                PredictionTarget::LogPSRegression => config.predict_log_ps_regression,
            })
            .collect()
    }
}

/// Predicted values for one molecule; `None` when a descriptor was missing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predictions {
    pub log_bb_class: Option<i64>,
    pub log_ps_class: Option<i64>,
    pub log_bb_regression: Option<f64>,
    pub log_ps_regression: Option<i64>,
}

impl Predictions {
    /// Output cell for one target
    pub fn cell(&self, target: PredictionTarget) -> Cell {
        match target {
            PredictionTarget::LogBBClass => self.log_bb_class.map_or(Cell::Missing, Cell::Integer),
            PredictionTarget::LogPSClass => self.log_ps_class.map_or(Cell::Missing, Cell::Integer),
            PredictionTarget::LogBBRegression => {
                self.log_bb_regression.map_or(Cell::Missing, Cell::Float)
            }
            PredictionTarget::LogPSRegression => {
                self.log_ps_regression.map_or(Cell::Missing, Cell::Integer)
            }
        }
    }
}

// =============================================================================
// Descriptors
// =============================================================================

/// Descriptor values for one molecule
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Descriptors {
    pub alogp: Option<f64>,
    pub tpsa: Option<f64>,
    pub bcut: Option<f64>,
    pub mannhold_logp: Option<f64>,
}

/// Supplies descriptor values for a parsed record
pub trait DescriptorSource: Send + Sync {
    fn descriptors(&self, record: &ParsedRecord) -> Descriptors;
}

/// Reads precomputed descriptors from record properties
///
/// Mannhold logP falls back to the atom-count estimate
/// `1.46 + 0.11 * nC - 0.11 * nHetero` when no property carries it.
#[derive(Debug, Clone)]
pub struct PropertyDescriptorSource {
    pub alogp_property: String,
    pub tpsa_property: String,
    pub bcut_property: String,
    pub mannhold_property: String,
}

impl Default for PropertyDescriptorSource {
    fn default() -> Self {
        Self {
            alogp_property: descriptor_properties::ALOGP.to_string(),
            tpsa_property: descriptor_properties::TPSA.to_string(),
            bcut_property: descriptor_properties::BCUT.to_string(),
            mannhold_property: descriptor_properties::MANNHOLD_LOGP.to_string(),
        }
    }
}

impl DescriptorSource for PropertyDescriptorSource {
    fn descriptors(&self, record: &ParsedRecord) -> Descriptors {
        Descriptors {
            alogp: numeric_property(record, &self.alogp_property),
            tpsa: numeric_property(record, &self.tpsa_property),
            bcut: numeric_property(record, &self.bcut_property),
            mannhold_logp: numeric_property(record, &self.mannhold_property)
                .or_else(|| mannhold_logp_estimate(record)),
        }
    }
}

/// Numeric value of a property; multi-valued text like `"1.2,3.4"` yields
/// the first entry
fn numeric_property(record: &ParsedRecord, name: &str) -> Option<f64> {
    match record.property(name)?.value()? {
        TypedValue::Integer(v) => Some(*v as f64),
        TypedValue::Float(v) => Some(*v),
        TypedValue::Text(text) => text.split(',').next()?.trim().parse::<f64>().ok(),
    }
}

/// Mannhold logP from heavy-atom composition
pub fn mannhold_logp_estimate(record: &ParsedRecord) -> Option<f64> {
    let lines: Vec<&str> = record.structure_block.lines().collect();
    let counts_line = lines.get(COUNTS_LINE_INDEX)?;

    let symbols: Vec<&str> = if counts_line.contains(V3000_MARKER) {
        let start = lines
            .iter()
            .position(|l| l.trim_end() == "M  V30 BEGIN ATOM")?;
        lines[start + 1..]
            .iter()
            .take_while(|l| l.trim_end() != "M  V30 END ATOM")
            .filter_map(|l| atom_symbol_v3000(l))
            .collect()
    } else {
        lines
            .iter()
            .skip(COUNTS_LINE_INDEX + 1)
            .take(record.atom_count)
            .filter_map(|l| atom_symbol_v2000(l))
            .collect()
    };

    if symbols.is_empty() {
        return None;
    }

    let carbons = symbols.iter().filter(|s| **s == "C").count() as f64;
    let hetero = symbols
        .iter()
        .filter(|s| !matches!(**s, "C" | "H" | "D" | "T"))
        .count() as f64;
    Some(1.46 + 0.11 * carbons - 0.11 * hetero)
}

// =============================================================================
// Predictors
// =============================================================================

/// Computes predictions for a parsed record
pub trait Predictor: Send + Sync {
    fn predict(&self, record: &ParsedRecord) -> Predictions;
}

/// Parameters of the fixed rule set
#[derive(Debug, Clone, PartialEq)]
pub struct RuleParameters {
    /// Label emitted for the LogBB class
    pub log_bb_class_label: i64,
    /// ALogP split between the BCUT and TPSA branches
    pub alogp_split: f64,
    /// Upper BCUT bound for a permeable prediction in the low-ALogP branch
    pub bcut_max: f64,
    /// Upper TPSA bound for a permeable prediction in the high-ALogP branch
    pub tpsa_max: f64,
    pub log_bb_intercept: f64,
    pub log_bb_tpsa_coefficient: f64,
    pub log_bb_logp_coefficient: f64,
    /// Value emitted for the LogPS regression
    pub log_ps_regression_value: i64,
}

impl Default for RuleParameters {
    fn default() -> Self {
        Self {
            log_bb_class_label: 1,
            alogp_split: -0.4263,
            bcut_max: 11.9,
            tpsa_max: 150.54553,
            log_bb_intercept: 0.05,
            log_bb_tpsa_coefficient: -0.011,
            log_bb_logp_coefficient: 0.19,
            log_ps_regression_value: 1,
        }
    }
}

/// Threshold and linear rules over a descriptor source
pub struct RulePredictor<S = PropertyDescriptorSource> {
    source: S,
    parameters: RuleParameters,
}

impl Default for RulePredictor {
    fn default() -> Self {
        Self::new(PropertyDescriptorSource::default(), RuleParameters::default())
    }
}

impl<S: DescriptorSource> RulePredictor<S> {
    pub fn new(source: S, parameters: RuleParameters) -> Self {
        Self { source, parameters }
    }

    pub fn parameters(&self) -> &RuleParameters {
        &self.parameters
    }

    /// Apply the rules to already computed descriptors
    pub fn predict_from(&self, d: &Descriptors) -> Predictions {
        let p = &self.parameters;

        let log_ps_class = d.alogp.and_then(|alogp| {
            if alogp <= p.alogp_split {
                d.bcut.map(|bcut| if bcut <= p.bcut_max { 1 } else { -1 })
            } else {
                d.tpsa.map(|tpsa| if tpsa <= p.tpsa_max { 1 } else { -1 })
            }
        });

        let log_bb_regression = match (d.tpsa, d.mannhold_logp) {
            (Some(tpsa), Some(logp)) => Some(
                p.log_bb_intercept
                    + p.log_bb_tpsa_coefficient * tpsa
                    + p.log_bb_logp_coefficient * logp,
            ),
            _ => None,
        };

        Predictions {
            log_bb_class: Some(p.log_bb_class_label),
            log_ps_class,
            log_bb_regression,
            log_ps_regression: Some(p.log_ps_regression_value),
        }
    }
}

impl<S: DescriptorSource> Predictor for RulePredictor<S> {
    fn predict(&self, record: &ParsedRecord) -> Predictions {
        self.predict_from(&self.source.descriptors(record))
    }
}
