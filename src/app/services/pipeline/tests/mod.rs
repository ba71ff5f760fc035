//! Test utilities for pipeline testing

use crate::app::adapters::locations::InputLocation;
use crate::config::ReaderConfig;

pub use crate::app::services::sdf_parser::tests::{v2000_block, v2000_entry};

// Test modules
mod controller_tests;

/// Record whose counts line cannot be parsed
pub fn broken_entry(title: &str) -> String {
    format!("{}\n\n\nbroken\nM  END\n> <LogD>\ntext\n\n$$$$\n", title)
}

/// In-memory location over the given SD text
pub fn memory(name: &str, data: &str) -> InputLocation {
    InputLocation::in_memory(name, data.as_bytes().to_vec())
}

/// Configuration with only the columns a test asks for
pub fn bare_config() -> ReaderConfig {
    ReaderConfig {
        extract_structure_block: false,
        ..ReaderConfig::default()
    }
    .with_predictions(false)
}
