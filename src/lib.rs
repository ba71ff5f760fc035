//! SDF Extractor Library
//!
//! A Rust library for reading chemical structure-data files (SD files) into
//! typed tables, with optional property schema discovery and rule-based
//! permeability predictions.
//!
//! This library provides tools for:
//! - Splitting a multi-record SD stream into individual molecule records
//! - Parsing molfile headers, counts lines and `> <name>` data items
//! - Inferring a stable column schema across heterogeneous records
//! - Streaming records from several input locations into success/failure tables
//! - Appending fixed descriptor-based prediction columns
//! - Writing the resulting tables to Parquet or CSV

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod pipeline;
        pub mod prediction;
        pub mod schema_discovery;
        pub mod sdf_parser;
        pub mod table_writer;
    }
    pub mod adapters {
        pub mod locations;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{Cell, ParsedRecord, PropertyKind, PropertyValue};
pub use config::ReaderConfig;

/// Result type alias for the SDF extractor
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for SDF extraction operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error, raised before any record is read
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A persisted setting could not be interpreted
    #[error("Invalid setting '{key}': {message}")]
    Settings { key: String, message: String },

    /// A single record could not be parsed
    #[error("Record parse error: {message}")]
    RecordParse { message: String },

    /// Table output error
    #[error("Table writing error: {message}")]
    TableWriting {
        message: String,
        #[source]
        source: polars::error::PolarsError,
    },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Directory traversal error
    #[error("Directory traversal error: {message}")]
    DirectoryTraversal {
        message: String,
        #[source]
        source: walkdir::Error,
    },

    /// Invalid glob pattern for input expansion
    #[error("Invalid input pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a settings error for a specific key
    pub fn settings(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Settings {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a record parse error
    pub fn record_parse(message: impl Into<String>) -> Self {
        Self::RecordParse {
            message: message.into(),
        }
    }

    /// Create a table writing error
    pub fn table_writing(message: impl Into<String>, source: polars::error::PolarsError) -> Self {
        Self::TableWriting {
            message: message.into(),
            source,
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a directory traversal error
    pub fn directory_traversal(message: impl Into<String>, source: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: message.into(),
            source,
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<polars::error::PolarsError> for Error {
    fn from(error: polars::error::PolarsError) -> Self {
        Self::TableWriting {
            message: "Polars operation failed".to_string(),
            source: error,
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(error: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: "Directory traversal failed".to_string(),
            source: error,
        }
    }
}

impl From<glob::PatternError> for Error {
    fn from(error: glob::PatternError) -> Self {
        Self::Pattern {
            pattern: String::new(),
            source: error,
        }
    }
}

impl From<app::services::sdf_parser::ParseFailure> for Error {
    fn from(failure: app::services::sdf_parser::ParseFailure) -> Self {
        Self::RecordParse {
            message: failure.to_string(),
        }
    }
}
