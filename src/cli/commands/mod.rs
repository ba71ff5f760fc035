//! Command implementations for the SD-file extractor CLI
//!
//! Each command lives in its own module:
//! - `extract`: full read into success and failure tables
//! - `scan`: property discovery only

pub mod extract;
pub mod scan;
pub mod shared;

pub use shared::CommandReport;

use crate::Result;
use crate::cli::args::Commands;
use tokio_util::sync::CancellationToken;

/// Dispatch to the subcommand handler
pub async fn run(command: Commands, cancel: CancellationToken) -> Result<CommandReport> {
    match command {
        Commands::Extract(args) => extract::run_extract(args, cancel).await,
        Commands::Scan(args) => scan::run_scan(args, cancel).await,
    }
}
