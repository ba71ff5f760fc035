//! Progress accounting for pipeline passes
//!
//! The pipeline reports a fraction in `[0, 1]` when the amount of work can be
//! estimated (input sizes, or a record limit) and a message alone otherwise.
//! A run with discovery splits the range between the discovery pass and the
//! build pass.

use std::sync::Arc;
use tracing::trace;

/// Receiver of progress updates
///
/// `fraction` is `None` when no total is known; the message always carries
/// the record count.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, fraction: Option<f64>, message: &str);
}

/// Reporter that discards updates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _fraction: Option<f64>, _message: &str) {}
}

/// Estimate the total input size from per-location size hints
///
/// An unknown size adds the running total divided by the number of
/// locations seen so far, itself included. Returns `None` when the estimate
/// is zero.
pub fn estimate_total_size(sizes: &[Option<u64>]) -> Option<u64> {
    let mut total = 0u64;
    for (seen, size) in sizes.iter().enumerate() {
        match size {
            Some(bytes) => total += bytes,
            None => total += total / (seen as u64 + 1),
        }
    }
    (total > 0).then_some(total)
}

/// Basis for the progress fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgressBasis {
    Records(usize),
    Bytes(u64),
    Unknown,
}

/// Tracks progress of one pass and forwards it to a reporter
pub struct ProgressTracker {
    reporter: Arc<dyn ProgressReporter>,
    basis: ProgressBasis,
    offset: f64,
    span: f64,
    completed_bytes: u64,
    last_fraction: f64,
    phase: &'static str,
}

impl ProgressTracker {
    /// Create a tracker covering `[offset, offset + span]` of the overall range
    pub fn new(
        reporter: Arc<dyn ProgressReporter>,
        sizes: &[Option<u64>],
        record_limit: Option<usize>,
        offset: f64,
        span: f64,
        phase: &'static str,
    ) -> Self {
        let basis = match (record_limit, estimate_total_size(sizes)) {
            (Some(limit), _) if limit > 0 => ProgressBasis::Records(limit),
            (_, Some(total)) => ProgressBasis::Bytes(total),
            _ => ProgressBasis::Unknown,
        };
        trace!("{} progress basis: {:?}", phase, basis);

        Self {
            reporter,
            basis,
            offset,
            span,
            completed_bytes: 0,
            last_fraction: 0.0,
            phase,
        }
    }

    /// Mark the current location as fully consumed
    pub fn finish_location(&mut self, bytes: u64) {
        self.completed_bytes += bytes;
    }

    /// Report progress after a record
    pub fn update(&mut self, records: usize, current_location_bytes: u64) {
        let message = format!("{}: {} molecule(s) read", self.phase, records);

        let fraction = match self.basis {
            ProgressBasis::Records(limit) => Some(records as f64 / limit as f64),
            ProgressBasis::Bytes(total) => {
                Some((self.completed_bytes + current_location_bytes) as f64 / total as f64)
            }
            ProgressBasis::Unknown => None,
        };

        match fraction {
            Some(f) => {
                // Estimated totals can be exceeded; never report backwards
                self.last_fraction = self.last_fraction.max(f.min(1.0));
                self.reporter
                    .report(Some(self.offset + self.span * self.last_fraction), &message);
            }
            None => self.reporter.report(None, &message),
        }
    }

    /// Overall fraction reported so far, `None` without a known total
    pub fn current(&self) -> Option<f64> {
        match self.basis {
            ProgressBasis::Unknown => None,
            _ => Some(self.offset + self.span * self.last_fraction),
        }
    }
}
