//! Shared components for CLI commands
//!
//! Logging setup, terminal progress reporting, run reports and error
//! classification used by both `extract` and `scan`.

use std::sync::Arc;
use std::time::Duration;

use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, warn};

use crate::app::services::pipeline::{ProgressReporter, RunStatus};
use crate::app::services::table_writer::WrittenTables;
use crate::cli::args::{OutputArgs, ReportFormat};
use crate::config::{PropertyRequest, ReaderConfig};
use crate::{Error, Result};

/// Progress bar resolution; pipeline fractions are scaled to this length
const PROGRESS_STEPS: u64 = 1000;

/// Outcome of a CLI command, printed as the final report
#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: &'static str,
    pub status: RunStatus,

    /// Written tables, for `extract`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<WrittenTables>,

    /// Discovered properties, for `scan`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<PropertyRequest>>,

    #[serde(skip)]
    pub elapsed: Duration,

    pub elapsed_seconds: f64,
}

impl CommandReport {
    pub fn new(command: &'static str, status: RunStatus, elapsed: Duration) -> Self {
        Self {
            command,
            status,
            tables: None,
            properties: None,
            elapsed,
            elapsed_seconds: elapsed.as_secs_f64(),
        }
    }

    /// Format a byte count in human-readable form
    pub fn format_size(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", bytes, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Print the report in the requested format
    pub fn print(&self, format: ReportFormat) -> Result<()> {
        match format {
            ReportFormat::Human => {
                print!("{}", self.render_human());
                Ok(())
            }
            ReportFormat::Json => {
                println!("{}", self.render_json()?);
                Ok(())
            }
        }
    }

    pub fn render_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::configuration(format!("Failed to serialize report: {}", e)))
    }

    pub fn render_human(&self) -> String {
        let status = &self.status;
        let mut out = String::new();

        let heading = if status.cancelled {
            format!("{} cancelled", self.command).bright_yellow().bold()
        } else {
            format!("{} complete", self.command).bright_green().bold()
        };
        out.push_str(&format!("\n{}\n", heading));
        out.push_str(&format!(
            "   • Records read: {}\n",
            status.records_attempted.to_string().bright_white().bold()
        ));
        out.push_str(&format!("   • Parsed: {}\n", status.records_succeeded));
        if status.has_failures() {
            out.push_str(&format!(
                "   • Failed: {}\n",
                status.records_failed.to_string().bright_red().bold()
            ));
        }
        out.push_str(&format!(
            "   • Input read: {} from {} location(s)\n",
            Self::format_size(status.bytes_read),
            status.locations_read
        ));
        if status.limit_reached {
            out.push_str("   • Stopped at the record limit\n");
        }
        out.push_str(&format!("   • Time: {}\n", HumanDuration(self.elapsed)));

        if let Some(tables) = &self.tables {
            out.push_str(&format!("\n{}\n", "Output tables".bright_green().bold()));
            out.push_str(&format!(
                "   • {} ({} rows)\n",
                tables.success_path.display(),
                tables.success_rows
            ));
            out.push_str(&format!(
                "   • {} ({} rows)\n",
                tables.failure_path.display(),
                tables.failure_rows
            ));
        }

        if let Some(properties) = &self.properties {
            out.push_str(&format!(
                "\n{}\n",
                format!("{} properties", properties.len()).bright_green().bold()
            ));
            for property in properties {
                out.push_str(&format!("   • {} ({})\n", property.name, property.kind));
            }
        }

        if let Some(warning) = &status.warning {
            out.push_str(&format!("\n{} {}\n", "warning:".yellow().bold(), warning));
        }
        out
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(args: &OutputArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sdf_extractor={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| Error::configuration(format!("Failed to initialise logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Validate a configuration, logging stale locations first
pub fn prepare_config(config: &ReaderConfig) -> Result<()> {
    for warning in config.check_locations() {
        warn!("{}", warning);
    }
    config.validate()
}

/// Check if an error is critical enough to stop processing
pub fn is_critical_error(error: &Error) -> bool {
    matches!(
        error,
        Error::Configuration { .. }
            | Error::Settings { .. }
            | Error::FileNotFound { .. }
            | Error::Pattern { .. }
    )
}

/// Terminal progress display fed by the pipeline
#[derive(Clone)]
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    /// Create a progress display, hidden when `visible` is false
    pub fn new(visible: bool) -> Arc<Self> {
        let bar = if visible {
            ProgressBar::new(PROGRESS_STEPS)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(bar_style());
        bar.enable_steady_tick(Duration::from_millis(120));
        Arc::new(Self { bar })
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl ProgressReporter for TerminalProgress {
    fn report(&self, fraction: Option<f64>, message: &str) {
        match fraction {
            Some(fraction) => {
                let position = (fraction.clamp(0.0, 1.0) * PROGRESS_STEPS as f64) as u64;
                self.bar.set_position(position);
            }
            None => {
                // Without a known total the bar degrades to a spinner
                self.bar.set_style(spinner_style());
            }
        }
        self.bar.set_message(message.to_string());
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
