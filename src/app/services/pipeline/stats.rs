//! Run status and statistics for pipeline executions

use serde::{Deserialize, Serialize};

/// Outcome of one pipeline pass or run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    /// Records handed to the parser (successes + failures)
    pub records_attempted: usize,

    pub records_succeeded: usize,
    pub records_failed: usize,

    /// Bytes consumed across all locations
    pub bytes_read: u64,

    /// Locations opened during the run
    pub locations_read: usize,

    /// The run stopped early because cancellation was requested
    pub cancelled: bool,

    /// The run stopped because the record limit was reached
    pub limit_reached: bool,

    /// Aggregate warning, present when any record failed to parse
    pub warning: Option<String>,
}

impl RunStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.records_attempted == 0 {
            0.0
        } else {
            (self.records_succeeded as f64 / self.records_attempted as f64) * 100.0
        }
    }

    pub fn has_failures(&self) -> bool {
        self.records_failed > 0
    }

    /// Set the aggregate warning from the failure count
    pub fn finalize_warning(&mut self) {
        self.warning = self
            .has_failures()
            .then(|| format!("Failed to parse {} record(s)", self.records_failed));
    }

    /// Get summary line for logging
    pub fn summary(&self) -> String {
        format!(
            "{} records read from {} location(s): {} succeeded, {} failed ({:.1}% success){}{}",
            self.records_attempted,
            self.locations_read,
            self.records_succeeded,
            self.records_failed,
            self.success_rate(),
            if self.limit_reached { ", limit reached" } else { "" },
            if self.cancelled { ", cancelled" } else { "" },
        )
    }
}
