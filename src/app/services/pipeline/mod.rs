//! Streaming pipeline from SD input locations to typed tables
//!
//! ## Architecture
//!
//! - [`controller`] - Pass orchestration, limits, cancellation, failure routing
//! - [`row_builder`] - Column layout and per-record row construction
//! - [`progress`] - Progress estimation and reporting
//! - [`sink`] - Output sinks for success and failure rows
//! - [`stats`] - Run status and summary
//!
//! ## Usage
//!
//! ```rust
//! use sdf_extractor::ReaderConfig;
//! use sdf_extractor::app::adapters::locations::InputLocation;
//! use sdf_extractor::app::services::pipeline::{CollectingSink, Pipeline};
//!
//! # fn example() -> sdf_extractor::Result<()> {
//! let config = ReaderConfig::default().with_discovery();
//! let pipeline = Pipeline::new(config)?;
//! let locations = vec![InputLocation::parse("molecules.sdf")?];
//!
//! let mut sink = CollectingSink::new();
//! let status = pipeline.execute(&locations, &mut sink)?;
//! println!("{}", status.summary());
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod progress;
pub mod row_builder;
pub mod sink;
pub mod stats;

#[cfg(test)]
mod tests;

// Re-export main types for easy access
pub use controller::{DiscoveryOutcome, Pipeline, SchemaStrategy};
pub use progress::{NoProgress, ProgressReporter, ProgressTracker};
pub use row_builder::{ColumnSource, RowBuilder};
pub use sink::{CollectingSink, ExtractedTables, RowSink};
pub use stats::RunStatus;
