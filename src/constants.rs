//! Application constants for the SDF extractor
//!
//! This module contains format markers, output column names, settings keys
//! and default values used throughout the application.

// =============================================================================
// SD-file Format Markers
// =============================================================================

/// Line that terminates each record in an SD file
pub const RECORD_TERMINATOR: &str = "$$$$";

/// Line that closes the molfile (header + connection table) block
pub const MOLFILE_END: &str = "M  END";

/// Marker on the counts line of extended (V3000) molfiles
pub const V3000_MARKER: &str = "V3000";

/// Prefix of the V3000 counts line inside the connection table
pub const V3000_COUNTS_PREFIX: &str = "M  V30 COUNTS";

/// Zero-based index of the counts line within a molfile block
pub const COUNTS_LINE_INDEX: usize = 3;

/// Number of header lines (title, program, comment) preceding the counts line
pub const HEADER_LINE_COUNT: usize = 3;

/// Width of each fixed-position field on a V2000 counts line
pub const COUNTS_FIELD_WIDTH: usize = 3;

/// File extensions treated as SD/mol input when expanding directories
pub const SDF_EXTENSIONS: &[&str] = &["sdf", "sd", "mol"];

/// Location identifier used for standard input
pub const STDIN_LOCATION: &str = "-";

// =============================================================================
// Output Column Names
// =============================================================================

pub mod columns {
    /// Whole record text
    pub const MOLECULE: &str = "Molecule";
    /// Header block through `M  END`
    pub const MOL_BLOCK: &str = "Mol Block";
    /// Connection table block
    pub const CTAB_BLOCK: &str = "Ctab Block";
    /// Record title
    pub const MOLECULE_NAME: &str = "Molecule name";
    pub const ATOM_COUNT: &str = "Atom count";
    pub const BOND_COUNT: &str = "Bond count";
    pub const SOURCE_LOCATION: &str = "Source location";

    /// Failure table columns
    pub const FAILURE_RECORD: &str = "SDF string";
    pub const FAILURE_ERROR: &str = "Error";
    pub const FAILURE_SOURCE: &str = "Source file";

    /// Key column prepended when tables are written to disk
    pub const ROW_ID: &str = "Row ID";

    /// Prediction columns
    pub const LOG_BB_CLASSIFY: &str = "LogBBclassify";
    pub const LOG_PS_CLASSIFY: &str = "LogPSclassify";
    pub const LOG_BB_REGRESSION: &str = "LogBBreg";
    pub const LOG_PS_REGRESSION: &str = "LogPSreg";
}

/// Prefix for generated row keys
pub const ROW_KEY_PREFIX: &str = "Row";

/// Message used when a failure carries no description
pub const NO_ERROR_MESSAGE: &str = "<no error message available>";

// =============================================================================
// Settings Keys
// =============================================================================

pub mod settings_keys {
    pub const LOCATIONS: &str = "locations";
    pub const USE_RECORD_TITLE_AS_KEY: &str = "useRecordTitleAsKey";
    pub const EXTRACT_STRUCTURE_BLOCK: &str = "extractStructureBlock";
    pub const EXTRACT_HEADER_BLOCK: &str = "extractHeaderBlock";
    pub const EXTRACT_CONNECTION_TABLE: &str = "extractConnectionTable";
    pub const EXTRACT_NAME: &str = "extractName";
    pub const EXTRACT_ATOM_BOND_COUNTS: &str = "extractAtomBondCounts";
    pub const EXTRACT_ALL_PROPERTIES: &str = "extractAllProperties";
    pub const PROPERTIES: &str = "properties";
    pub const LIMIT_RECORD_COUNT: &str = "limitRecordCount";
    pub const RECORD_LIMIT: &str = "recordLimit";
    pub const ADD_SOURCE_LOCATION_COLUMN: &str = "addSourceLocationColumn";
    pub const PREDICT_LOG_BB_CLASS: &str = "predictLogBBClass";
    pub const PREDICT_LOG_PS_CLASS: &str = "predictLogPSClass";
    pub const PREDICT_LOG_BB_REGRESSION: &str = "predictLogBBRegression";
    pub const PREDICT_LOG_PS_REGRESSION: &str = "predictLogPSRegression";

    /// Suffixes for flattened list entries
    pub const COUNT_SUFFIX: &str = "count";
    pub const NAME_SUFFIX: &str = "name";
    pub const EXTRACT_SUFFIX: &str = "extract";
    pub const KIND_SUFFIX: &str = "kind";
}

// =============================================================================
// Defaults
// =============================================================================

/// Default record limit when limiting is switched on
pub const DEFAULT_RECORD_LIMIT: usize = 100;

/// Application directory name under the user's config directory
pub const APP_CONFIG_DIR: &str = "sdf-extractor";

/// Default settings file name
pub const SETTINGS_FILE_NAME: &str = "settings.conf";

/// Fraction of the progress range given to the discovery pass
pub const DISCOVERY_PROGRESS_SHARE: f64 = 0.5;

/// Default property names holding precomputed descriptor values
pub mod descriptor_properties {
    pub const ALOGP: &str = "ALogP";
    pub const TPSA: &str = "TPSA";
    pub const BCUT: &str = "BCUT";
    pub const MANNHOLD_LOGP: &str = "MannholdLogP";
}
