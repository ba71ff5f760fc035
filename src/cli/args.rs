//! Command-line argument definitions for the SD-file extractor
//!
//! This module defines the CLI interface using the clap derive API. Options
//! given on the command line override values loaded from a settings file.

use crate::app::adapters::locations::expand_inputs;
use crate::app::models::PropertyKind;
use crate::app::services::table_writer::OutputFormat as TableFormat;
use crate::config::{PropertyRequest, ReaderConfig, default_settings_path};
use crate::{Error, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// CLI arguments for the SD-file extractor
///
/// Reads one or more SD files into typed molecule tables, with optional
/// property discovery and permeability prediction columns.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sdf-extractor",
    version,
    about = "Extract molecule tables from SD files",
    long_about = "Reads multi-record SD (structure-data) files, parses every molecule record \
                  and writes a success table of typed property columns plus a failure table \
                  holding the records that could not be parsed."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Read SD input into success and failure tables
    Extract(ExtractArgs),
    /// Discover the property names and kinds present in SD input
    Scan(ScanArgs),
}

/// Input selection shared by all commands
#[derive(Debug, Clone, ClapArgs)]
pub struct InputArgs {
    /// Input files, directories, glob patterns, `file:` URLs or `-` for stdin
    ///
    /// Directories are expanded to the SD files they contain. When omitted,
    /// the locations stored in the settings file are read.
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Settings file to start from
    #[arg(
        short = 's',
        long = "settings",
        value_name = "FILE",
        help = "Load options from a settings file"
    )]
    pub settings: Option<PathBuf>,

    /// Write the effective options to a settings file after the run
    #[arg(long = "save-settings", value_name = "FILE")]
    pub save_settings: Option<PathBuf>,

    /// Stop after this many records (successes and failures together)
    #[arg(short = 'n', long = "limit", value_name = "COUNT")]
    pub limit: Option<usize>,
}

/// Logging and report options shared by all commands
#[derive(Debug, Clone, ClapArgs)]
pub struct OutputArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format for the run report
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for results"
    )]
    pub output_format: ReportFormat,
}

/// Arguments for the extract command
#[derive(Debug, Clone, Parser)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Directory receiving the output tables
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        default_value = ".",
        help = "Directory for the output tables"
    )]
    pub output_dir: PathBuf,

    /// File stem of the output tables
    #[arg(long = "table-name", value_name = "STEM", default_value = "molecules")]
    pub table_name: String,

    #[arg(long = "format", value_enum, default_value = "parquet")]
    pub format: TableFormat,

    /// Discover all properties instead of using a fixed list
    #[arg(short = 'a', long = "all-properties", conflicts_with = "properties")]
    pub all_properties: bool,

    /// Fixed property columns as NAME or NAME:KIND (integer, float, text)
    #[arg(short = 'p', long = "property", value_name = "NAME[:KIND]")]
    pub properties: Vec<PropertySpec>,

    /// Use record titles as row keys
    #[arg(long = "title-keys")]
    pub title_keys: bool,

    /// Leave out the whole-record `Molecule` column
    #[arg(long = "no-molecule")]
    pub no_molecule: bool,

    /// Add the `Mol Block` column
    #[arg(long = "mol-block")]
    pub mol_block: bool,

    /// Add the `Ctab Block` column
    #[arg(long = "ctab-block")]
    pub ctab_block: bool,

    /// Add the `Molecule name` column
    #[arg(long = "names")]
    pub names: bool,

    /// Add the `Atom count` and `Bond count` columns
    #[arg(long = "counts")]
    pub counts: bool,

    /// Add the `Source location` column
    #[arg(long = "source-column")]
    pub source_column: bool,

    /// Leave out all prediction columns
    #[arg(long = "no-predictions")]
    pub no_predictions: bool,
}

/// Arguments for the scan command
#[derive(Debug, Clone, Parser)]
pub struct ScanArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Output format for run reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

/// A property column given on the command line
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    pub request: PropertyRequest,
}

impl FromStr for PropertySpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, kind) = match s.rsplit_once(':') {
            Some((name, kind)) => (name.trim(), kind.parse::<PropertyKind>()?),
            None => (s.trim(), PropertyKind::Text),
        };
        if name.is_empty() {
            return Err(Error::configuration(format!(
                "Property '{}' has an empty name",
                s
            )));
        }
        Ok(PropertySpec {
            request: PropertyRequest::new(name, true, kind),
        })
    }
}

impl Args {
    /// Get the command if one was specified
    pub fn get_command(&self) -> Option<&Commands> {
        self.command.as_ref()
    }
}

impl InputArgs {
    /// Load the starting configuration and apply the input overrides
    ///
    /// Without `--settings`, a settings file in the default location is used
    /// when it exists.
    pub fn base_config(&self) -> Result<ReaderConfig> {
        let settings = self
            .settings
            .clone()
            .or_else(|| default_settings_path().filter(|path| path.is_file()));

        let mut config = match settings {
            Some(path) => ReaderConfig::load(&path)?,
            None => ReaderConfig::default(),
        };

        if !self.inputs.is_empty() {
            config.locations = expand_inputs(&self.inputs)?;
        }
        if let Some(limit) = self.limit {
            config.limit_record_count = true;
            config.record_limit = limit;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.limit == Some(0) {
            return Err(Error::configuration(
                "Record limit must be greater than 0".to_string(),
            ));
        }
        if let Some(settings) = &self.settings {
            if !settings.is_file() {
                return Err(Error::configuration(format!(
                    "Settings file does not exist: {}",
                    settings.display()
                )));
            }
        }
        Ok(())
    }
}

impl OutputArgs {
    /// Get the log level string for tracing
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl ExtractArgs {
    /// Validate the extract command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        self.input.validate()?;

        if self.table_name.trim().is_empty() {
            return Err(Error::configuration(
                "Table name cannot be empty".to_string(),
            ));
        }
        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(Error::configuration(format!(
                "Output path is not a directory: {}",
                self.output_dir.display()
            )));
        }
        Ok(())
    }

    /// Build the effective reader configuration
    pub fn to_config(&self) -> Result<ReaderConfig> {
        let mut config = self.input.base_config()?;

        if self.all_properties {
            config.extract_all_properties = true;
        } else if !self.properties.is_empty() {
            config = config.with_properties(
                self.properties.iter().map(|p| p.request.clone()).collect(),
            );
        }

        config.use_record_title_as_key |= self.title_keys;
        if self.no_molecule {
            config.extract_structure_block = false;
        }
        config.extract_header_block |= self.mol_block;
        config.extract_connection_table |= self.ctab_block;
        config.extract_name |= self.names;
        config.extract_atom_bond_counts |= self.counts;
        config.add_source_location_column |= self.source_column;
        if self.no_predictions {
            config = config.with_predictions(false);
        }

        Ok(config)
    }
}

impl ScanArgs {
    pub fn validate(&self) -> Result<()> {
        self.input.validate()
    }

    /// Configuration for a discovery-only run
    pub fn to_config(&self) -> Result<ReaderConfig> {
        Ok(self.input.base_config()?.with_discovery())
    }
}
