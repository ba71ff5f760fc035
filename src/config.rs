//! Reader configuration and settings persistence.
//!
//! Provides the [`ReaderConfig`] consumed by the pipeline, the fixed property
//! request list, validation rules, and a flat `key=value` settings store that
//! every option round-trips through.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::app::adapters::locations::{InputLocation, LocationSource};
use crate::app::models::PropertyKind;
use crate::constants::{
    APP_CONFIG_DIR, DEFAULT_RECORD_LIMIT, SETTINGS_FILE_NAME, settings_keys as keys,
};
use crate::{Error, Result};

// =============================================================================
// Property Requests
// =============================================================================

/// One requested property column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRequest {
    pub name: String,

    /// Whether the property becomes an output column
    pub extract: bool,

    /// Declared column kind
    pub kind: PropertyKind,
}

impl PropertyRequest {
    pub fn new(name: impl Into<String>, extract: bool, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            extract,
            kind,
        }
    }
}

// =============================================================================
// Reader Configuration
// =============================================================================

/// Options for one read of SD input locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderConfig {
    /// Input location identifiers, read in order
    pub locations: Vec<String>,

    /// Use record titles as row keys instead of sequential keys
    pub use_record_title_as_key: bool,

    /// Emit the whole record text (`Molecule`)
    pub extract_structure_block: bool,

    /// Emit the molfile header block through `M  END` (`Mol Block`)
    pub extract_header_block: bool,

    /// Emit the connection table (`Ctab Block`)
    pub extract_connection_table: bool,

    pub extract_name: bool,
    pub extract_atom_bond_counts: bool,

    /// Discover the property schema instead of using `properties`
    pub extract_all_properties: bool,

    /// Fixed property column request
    pub properties: Vec<PropertyRequest>,

    pub limit_record_count: bool,
    pub record_limit: usize,

    pub add_source_location_column: bool,

    #[serde(rename = "predictLogBBClass")]
    pub predict_log_bb_class: bool,
    #[serde(rename = "predictLogPSClass")]
    pub predict_log_ps_class: bool,
    #[serde(rename = "predictLogBBRegression")]
    pub predict_log_bb_regression: bool,
    #[serde(rename = "predictLogPSRegression")]
    pub predict_log_ps_regression: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            locations: Vec::new(),
            use_record_title_as_key: false,
            extract_structure_block: true,
            extract_header_block: false,
            extract_connection_table: false,
            extract_name: false,
            extract_atom_bond_counts: false,
            extract_all_properties: false,
            properties: Vec::new(),
            limit_record_count: false,
            record_limit: DEFAULT_RECORD_LIMIT,
            add_source_location_column: false,
            predict_log_bb_class: true,
            predict_log_ps_class: true,
            predict_log_bb_regression: true,
            predict_log_ps_regression: true,
        }
    }
}

impl ReaderConfig {
    /// Create a configuration reading the given locations
    pub fn new(locations: Vec<String>) -> Self {
        Self {
            locations,
            ..Self::default()
        }
    }

    /// Builder pattern methods for easy configuration
    pub fn with_locations(mut self, locations: Vec<String>) -> Self {
        self.locations = locations;
        self
    }

    pub fn with_properties(mut self, properties: Vec<PropertyRequest>) -> Self {
        self.properties = properties;
        self.extract_all_properties = false;
        self
    }

    pub fn with_discovery(mut self) -> Self {
        self.extract_all_properties = true;
        self
    }

    pub fn with_record_limit(mut self, limit: usize) -> Self {
        self.limit_record_count = true;
        self.record_limit = limit;
        self
    }

    pub fn with_title_keys(mut self) -> Self {
        self.use_record_title_as_key = true;
        self
    }

    pub fn with_source_location_column(mut self) -> Self {
        self.add_source_location_column = true;
        self
    }

    /// Switch all four prediction columns on or off
    pub fn with_predictions(mut self, enabled: bool) -> Self {
        self.predict_log_bb_class = enabled;
        self.predict_log_ps_class = enabled;
        self.predict_log_bb_regression = enabled;
        self.predict_log_ps_regression = enabled;
        self
    }

    /// Effective record limit, `None` when limiting is off
    pub fn effective_record_limit(&self) -> Option<usize> {
        self.limit_record_count.then_some(self.record_limit)
    }

    /// Whether any prediction column is requested
    pub fn any_prediction(&self) -> bool {
        self.predict_log_bb_class
            || self.predict_log_ps_class
            || self.predict_log_bb_regression
            || self.predict_log_ps_regression
    }

    /// Resolve location identifiers into openable locations
    pub fn input_locations(&self) -> Result<Vec<InputLocation>> {
        self.locations
            .iter()
            .map(|l| InputLocation::parse(l))
            .collect()
    }

    /// Validate configuration before any record is read
    pub fn validate(&self) -> Result<()> {
        if self.locations.is_empty() {
            return Err(Error::configuration("No input locations specified"));
        }

        if self.limit_record_count && self.record_limit < 1 {
            return Err(Error::configuration(
                "Record limit must be at least 1 when limiting is enabled",
            ));
        }

        for location in self.input_locations()? {
            location.check_accessible().map_err(|e| {
                Error::configuration(format!(
                    "Input location '{}' is not readable: {}",
                    location.identifier(),
                    e
                ))
            })?;
        }

        let mut seen = std::collections::HashSet::new();
        for request in &self.properties {
            if request.name.is_empty() {
                return Err(Error::configuration("Property request with an empty name"));
            }
            if !seen.insert(request.name.as_str()) {
                return Err(Error::configuration(format!(
                    "Property '{}' is requested more than once",
                    request.name
                )));
            }
        }

        Ok(())
    }

    /// Warnings for file locations that can no longer be opened
    ///
    /// Used after restoring settings: a stale location is reported but does
    /// not make the settings invalid.
    pub fn check_locations(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for identifier in &self.locations {
            match InputLocation::parse(identifier) {
                Ok(location) => {
                    if let LocationSource::File(_) = location.source() {
                        if let Err(e) = location.check_accessible() {
                            warn!("Input location '{}' is no longer accessible", identifier);
                            warnings.push(format!(
                                "Input location '{}' is no longer accessible: {}",
                                identifier, e
                            ));
                        }
                    }
                }
                Err(e) => warnings.push(e.to_string()),
            }
        }
        warnings
    }

    // =========================================================================
    // Settings round-trip
    // =========================================================================

    /// Write every option into a settings store
    pub fn save_settings(&self, store: &mut SettingsStore) {
        store.set_list(keys::LOCATIONS, &self.locations);
        store.set_bool(keys::USE_RECORD_TITLE_AS_KEY, self.use_record_title_as_key);
        store.set_bool(keys::EXTRACT_STRUCTURE_BLOCK, self.extract_structure_block);
        store.set_bool(keys::EXTRACT_HEADER_BLOCK, self.extract_header_block);
        store.set_bool(keys::EXTRACT_CONNECTION_TABLE, self.extract_connection_table);
        store.set_bool(keys::EXTRACT_NAME, self.extract_name);
        store.set_bool(keys::EXTRACT_ATOM_BOND_COUNTS, self.extract_atom_bond_counts);
        store.set_bool(keys::EXTRACT_ALL_PROPERTIES, self.extract_all_properties);

        store.set(
            format!("{}.{}", keys::PROPERTIES, keys::COUNT_SUFFIX),
            self.properties.len().to_string(),
        );
        for (i, request) in self.properties.iter().enumerate() {
            let prefix = format!("{}.{}", keys::PROPERTIES, i);
            store.set(format!("{}.{}", prefix, keys::NAME_SUFFIX), request.name.clone());
            store.set_bool(&format!("{}.{}", prefix, keys::EXTRACT_SUFFIX), request.extract);
            store.set(
                format!("{}.{}", prefix, keys::KIND_SUFFIX),
                request.kind.as_str().to_string(),
            );
        }

        store.set_bool(keys::LIMIT_RECORD_COUNT, self.limit_record_count);
        store.set(keys::RECORD_LIMIT, self.record_limit.to_string());
        store.set_bool(keys::ADD_SOURCE_LOCATION_COLUMN, self.add_source_location_column);
        store.set_bool(keys::PREDICT_LOG_BB_CLASS, self.predict_log_bb_class);
        store.set_bool(keys::PREDICT_LOG_PS_CLASS, self.predict_log_ps_class);
        store.set_bool(keys::PREDICT_LOG_BB_REGRESSION, self.predict_log_bb_regression);
        store.set_bool(keys::PREDICT_LOG_PS_REGRESSION, self.predict_log_ps_regression);
    }

    /// Restore options from a settings store, defaulting missing keys
    pub fn load_settings(store: &SettingsStore) -> Result<Self> {
        let defaults = Self::default();

        let properties = {
            let count_key = format!("{}.{}", keys::PROPERTIES, keys::COUNT_SUFFIX);
            let count = store.get_usize(&count_key, 0)?;
            let mut properties = Vec::with_capacity(count);
            for i in 0..count {
                let prefix = format!("{}.{}", keys::PROPERTIES, i);
                let name_key = format!("{}.{}", prefix, keys::NAME_SUFFIX);
                let name = store
                    .get(&name_key)
                    .ok_or_else(|| Error::settings(&name_key, "missing property name"))?
                    .to_string();
                let extract =
                    store.get_bool(&format!("{}.{}", prefix, keys::EXTRACT_SUFFIX), true)?;
                let kind_key = format!("{}.{}", prefix, keys::KIND_SUFFIX);
                let kind = match store.get(&kind_key) {
                    Some(text) => text
                        .parse::<PropertyKind>()
                        .map_err(|e| Error::settings(&kind_key, e.to_string()))?,
                    None => PropertyKind::Text,
                };
                properties.push(PropertyRequest::new(name, extract, kind));
            }
            properties
        };

        let config = Self {
            locations: store.get_list(keys::LOCATIONS)?,
            use_record_title_as_key: store
                .get_bool(keys::USE_RECORD_TITLE_AS_KEY, defaults.use_record_title_as_key)?,
            extract_structure_block: store
                .get_bool(keys::EXTRACT_STRUCTURE_BLOCK, defaults.extract_structure_block)?,
            extract_header_block: store
                .get_bool(keys::EXTRACT_HEADER_BLOCK, defaults.extract_header_block)?,
            extract_connection_table: store
                .get_bool(keys::EXTRACT_CONNECTION_TABLE, defaults.extract_connection_table)?,
            extract_name: store.get_bool(keys::EXTRACT_NAME, defaults.extract_name)?,
            extract_atom_bond_counts: store
                .get_bool(keys::EXTRACT_ATOM_BOND_COUNTS, defaults.extract_atom_bond_counts)?,
            extract_all_properties: store
                .get_bool(keys::EXTRACT_ALL_PROPERTIES, defaults.extract_all_properties)?,
            properties,
            limit_record_count: store
                .get_bool(keys::LIMIT_RECORD_COUNT, defaults.limit_record_count)?,
            record_limit: store.get_usize(keys::RECORD_LIMIT, defaults.record_limit)?,
            add_source_location_column: store.get_bool(
                keys::ADD_SOURCE_LOCATION_COLUMN,
                defaults.add_source_location_column,
            )?,
            predict_log_bb_class: store
                .get_bool(keys::PREDICT_LOG_BB_CLASS, defaults.predict_log_bb_class)?,
            predict_log_ps_class: store
                .get_bool(keys::PREDICT_LOG_PS_CLASS, defaults.predict_log_ps_class)?,
            predict_log_bb_regression: store.get_bool(
                keys::PREDICT_LOG_BB_REGRESSION,
                defaults.predict_log_bb_regression,
            )?,
            predict_log_ps_regression: store.get_bool(
                keys::PREDICT_LOG_PS_REGRESSION,
                defaults.predict_log_ps_regression,
            )?,
        };

        debug!(
            "Loaded settings: {} locations, {} property requests",
            config.locations.len(),
            config.properties.len()
        );
        Ok(config)
    }

    /// Load a configuration from a settings file
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_settings(&SettingsStore::load(path)?)
    }

    /// Save this configuration to a settings file
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut store = SettingsStore::new();
        self.save_settings(&mut store);
        store.save(path)
    }
}

/// Default settings file under the user's configuration directory
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_CONFIG_DIR).join(SETTINGS_FILE_NAME))
}

// =============================================================================
// Settings Store
// =============================================================================

/// Flat, ordered key/value settings store
///
/// Persisted as one `key=value` line per entry. Backslashes, newlines and
/// carriage returns in values are escaped. Blank lines and lines starting
/// with `#` are ignored when loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsStore {
    entries: IndexMap<String, String>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, value.to_string());
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(text) => match text.trim() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(Error::settings(
                    key,
                    format!("expected true or false, found '{}'", other),
                )),
            },
        }
    }

    pub fn get_usize(&self, key: &str, default: usize) -> Result<usize> {
        match self.get(key) {
            None => Ok(default),
            Some(text) => text.trim().parse::<usize>().map_err(|e| {
                Error::settings(key, format!("expected a non-negative integer, found '{}' ({})", text, e))
            }),
        }
    }

    /// Store a list as `<key>.count` plus `<key>.<i>` entries
    pub fn set_list(&mut self, key: &str, values: &[String]) {
        self.set(format!("{}.{}", key, keys::COUNT_SUFFIX), values.len().to_string());
        for (i, value) in values.iter().enumerate() {
            self.set(format!("{}.{}", key, i), value.clone());
        }
    }

    pub fn get_list(&self, key: &str) -> Result<Vec<String>> {
        let count_key = format!("{}.{}", key, keys::COUNT_SUFFIX);
        let count = self.get_usize(&count_key, 0)?;
        (0..count)
            .map(|i| {
                let item_key = format!("{}.{}", key, i);
                self.get(&item_key)
                    .map(str::to_string)
                    .ok_or_else(|| Error::settings(&item_key, "missing list entry"))
            })
            .collect()
    }

    /// Parse settings text
    pub fn parse(text: &str) -> Result<Self> {
        let mut store = Self::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                Error::settings(
                    format!("line {}", number + 1),
                    format!("expected key=value, found '{}'", line),
                )
            })?;
            store.set(key.trim(), unescape(value));
        }
        Ok(store)
    }

    /// Render settings text
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for (key, value) in &self.entries {
            let _ = writeln!(text, "{}={}", key, escape(value));
        }
        text
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read settings file {}", path.display()), e)
        })?;
        Self::parse(&text)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::io(format!("Failed to create {}", parent.display()), e)
                })?;
            }
        }
        std::fs::write(path, self.to_text()).map_err(|e| {
            Error::io(format!("Failed to write settings file {}", path.display()), e)
        })
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn unescape(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some('\\') => unescaped.push('\\'),
            Some(other) => {
                unescaped.push('\\');
                unescaped.push(other);
            }
            None => unescaped.push('\\'),
        }
    }
    unescaped
}
