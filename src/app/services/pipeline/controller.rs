//! Streaming pipeline controller
//!
//! Drives splitter, parser, schema inference and row building over an
//! ordered list of input locations. One pass reads every location in order;
//! a run with property discovery makes two passes (discover, then build)
//! over the same records.

use std::io::Read;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::progress::{NoProgress, ProgressReporter, ProgressTracker};
use super::row_builder::RowBuilder;
use super::sink::RowSink;
use super::stats::RunStatus;
use crate::app::adapters::locations::{InputLocation, LocationSource};
use crate::app::models::{OutputRow, ParsedRecord};
use crate::app::services::prediction::{Predictor, RulePredictor};
use crate::app::services::schema_discovery::SharedSchema;
use crate::app::services::sdf_parser::{ParseFailure, RawRecord, RecordParser, RecordSplitter};
use crate::config::{PropertyRequest, ReaderConfig};
use crate::constants::DISCOVERY_PROGRESS_SHARE;
use crate::{Error, Result};

/// How the property columns of a run are determined
#[derive(Debug, Clone)]
pub enum SchemaStrategy {
    /// Use the given requests as they are
    Fixed(Vec<PropertyRequest>),

    /// Run a discovery pass first, publishing progress into the shared schema
    Discover(SharedSchema),
}

impl SchemaStrategy {
    /// Strategy selected by a configuration
    pub fn from_config(config: &ReaderConfig) -> Self {
        if config.extract_all_properties {
            SchemaStrategy::Discover(SharedSchema::new())
        } else {
            SchemaStrategy::Fixed(config.properties.clone())
        }
    }
}

/// Result of a standalone discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    /// Discovered properties in first-seen order, all selected
    pub properties: Vec<PropertyRequest>,
    pub status: RunStatus,
}

/// One record as seen by a pass callback
struct RecordEvent<'a> {
    index: usize,
    source: &'a str,
    raw: &'a RawRecord,
    parsed: std::result::Result<ParsedRecord, ParseFailure>,
}

/// Streaming reader over SD input locations
pub struct Pipeline {
    config: ReaderConfig,
    parser: RecordParser,
    predictor: Option<Arc<dyn Predictor>>,
    cancel: CancellationToken,
    progress: Arc<dyn ProgressReporter>,
}

impl Pipeline {
    /// Create a pipeline with the default rule predictor
    pub fn new(config: ReaderConfig) -> Result<Self> {
        let predictor: Option<Arc<dyn Predictor>> = if config.any_prediction() {
            Some(Arc::new(RulePredictor::default()))
        } else {
            None
        };

        Ok(Self {
            config,
            parser: RecordParser::new()?,
            predictor,
            cancel: CancellationToken::new(),
            progress: Arc::new(NoProgress),
        })
    }

    /// Replace the predictor; `None` drops the prediction columns
    pub fn with_predictor(mut self, predictor: Option<Arc<dyn Predictor>>) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress = reporter;
        self
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Read all locations into the sink using the configured strategy
    pub fn execute(
        &self,
        locations: &[InputLocation],
        sink: &mut dyn RowSink,
    ) -> Result<RunStatus> {
        self.execute_with(SchemaStrategy::from_config(&self.config), locations, sink)
    }

    /// Read all locations into the sink with an explicit schema strategy
    pub fn execute_with(
        &self,
        strategy: SchemaStrategy,
        locations: &[InputLocation],
        sink: &mut dyn RowSink,
    ) -> Result<RunStatus> {
        ensure_locations(locations)?;

        let (properties, locations, build_offset) = match strategy {
            SchemaStrategy::Fixed(properties) => (properties, locations.to_vec(), 0.0),
            SchemaStrategy::Discover(shared) => {
                // Both passes must see the same bytes, so standard input is
                // buffered once up front
                let locations = buffer_stdin(locations)?;
                shared.lock().clear();
                let mut status =
                    self.discovery_pass(&locations, &shared, 0.0, DISCOVERY_PROGRESS_SHARE)?;
                let schema = shared.snapshot();
                info!("{}", schema.summary());
                if status.cancelled {
                    info!("Discovery cancelled, no rows built");
                    let builder = RowBuilder::new(
                        &self.config,
                        &schema.to_property_requests(),
                        self.predictor.clone(),
                    );
                    sink.begin(builder.success_spec(), builder.failure_spec())?;
                    // Reading totals stay; row counts describe built rows only
                    status.records_succeeded = 0;
                    status.records_failed = 0;
                    status.warning = None;
                    return Ok(status);
                }
                (schema.to_property_requests(), locations, DISCOVERY_PROGRESS_SHARE)
            }
        };

        let builder = RowBuilder::new(&self.config, &properties, self.predictor.clone());
        sink.begin(builder.success_spec(), builder.failure_spec())?;

        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.progress),
            &size_hints(&locations),
            self.config.effective_record_limit(),
            build_offset,
            1.0 - build_offset,
            "Reading molecules",
        );

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut status = self.run_pass(&locations, &mut tracker, |event| {
            let row = match event.parsed {
                Ok(record) => {
                    succeeded += 1;
                    OutputRow::Success(builder.build(&record, event.index, event.source))
                }
                Err(failure) => {
                    failed += 1;
                    warn!(
                        "Skipping unparseable record {} from {}: {}",
                        event.index, event.source, failure
                    );
                    OutputRow::Failure(builder.build_failure(
                        &event.raw.text,
                        &failure,
                        event.index,
                        event.source,
                    ))
                }
            };
            sink.push(row)
        })?;

        status.records_succeeded = succeeded;
        status.records_failed = failed;
        status.finalize_warning();
        if let Some(warning) = &status.warning {
            warn!("{}", warning);
        }
        info!("{}", status.summary());
        Ok(status)
    }

    /// Run discovery only, over the full progress range
    pub fn discover(
        &self,
        locations: &[InputLocation],
        schema: &SharedSchema,
    ) -> Result<DiscoveryOutcome> {
        ensure_locations(locations)?;
        schema.lock().clear();

        let status = self.discovery_pass(locations, schema, 0.0, 1.0)?;
        let snapshot = schema.snapshot();
        info!("{}", snapshot.summary());

        Ok(DiscoveryOutcome {
            properties: snapshot.to_property_requests(),
            status,
        })
    }

    fn discovery_pass(
        &self,
        locations: &[InputLocation],
        schema: &SharedSchema,
        offset: f64,
        span: f64,
    ) -> Result<RunStatus> {
        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.progress),
            &size_hints(locations),
            self.config.effective_record_limit(),
            offset,
            span,
            "Scanning properties",
        );

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut status = self.run_pass(locations, &mut tracker, |event| {
            match event.parsed {
                Ok(record) => {
                    succeeded += 1;
                    schema.update(&record.properties);
                }
                Err(failure) => {
                    failed += 1;
                    debug!("Discovery skips record {}: {}", event.index, failure);
                }
            }
            Ok(())
        })?;

        status.records_succeeded = succeeded;
        status.records_failed = failed;
        status.finalize_warning();
        Ok(status)
    }

    /// Read locations in order, handing every attempted record to `on_record`
    ///
    /// Stops without error on cancellation or when the record limit is
    /// reached. I/O failures abort the pass.
    fn run_pass<F>(
        &self,
        locations: &[InputLocation],
        tracker: &mut ProgressTracker,
        mut on_record: F,
    ) -> Result<RunStatus>
    where
        F: FnMut(RecordEvent<'_>) -> Result<()>,
    {
        let limit = self.config.effective_record_limit();
        let mut status = RunStatus::new();

        'locations: for location in locations {
            if self.cancel.is_cancelled() {
                status.cancelled = true;
                break;
            }
            if limit.is_some_and(|l| status.records_attempted >= l) {
                status.limit_reached = true;
                break;
            }

            info!("Reading {}", location.identifier());
            let reader = location.open()?;
            status.locations_read += 1;
            let mut splitter = RecordSplitter::new(reader);

            loop {
                if self.cancel.is_cancelled() {
                    info!("Cancelled after {} records", status.records_attempted);
                    status.cancelled = true;
                    status.bytes_read += splitter.bytes_read();
                    break 'locations;
                }
                if limit.is_some_and(|l| status.records_attempted >= l) {
                    debug!("Record limit of {:?} reached", limit);
                    status.limit_reached = true;
                    status.bytes_read += splitter.bytes_read();
                    break 'locations;
                }

                let raw = match splitter.next_record() {
                    Ok(Some(raw)) => raw,
                    Ok(None) => break,
                    Err(Error::Io { source, .. }) => {
                        return Err(Error::io(
                            format!("Failed reading {}", location.identifier()),
                            source,
                        ));
                    }
                    Err(other) => return Err(other),
                };

                let index = status.records_attempted;
                status.records_attempted += 1;

                on_record(RecordEvent {
                    index,
                    source: location.identifier(),
                    parsed: self.parser.parse(&raw.text),
                    raw: &raw,
                })?;

                tracker.update(status.records_attempted, splitter.bytes_read());
            }

            debug!(
                "Finished {} after {} bytes",
                location.identifier(),
                splitter.bytes_read()
            );
            status.bytes_read += splitter.bytes_read();
            tracker.finish_location(splitter.bytes_read());
        }

        Ok(status)
    }
}

fn ensure_locations(locations: &[InputLocation]) -> Result<()> {
    if locations.is_empty() {
        return Err(Error::configuration("No input locations specified"));
    }
    Ok(())
}

fn size_hints(locations: &[InputLocation]) -> Vec<Option<u64>> {
    locations.iter().map(InputLocation::size_hint).collect()
}

fn buffer_stdin(locations: &[InputLocation]) -> Result<Vec<InputLocation>> {
    locations
        .iter()
        .map(|location| match location.source() {
            LocationSource::Stdin => {
                let mut data = Vec::new();
                location
                    .open()?
                    .read_to_end(&mut data)
                    .map_err(|e| Error::io("Failed to read standard input", e))?;
                debug!("Buffered {} bytes from standard input", data.len());
                Ok(InputLocation::in_memory(location.identifier(), data))
            }
            _ => Ok(location.clone()),
        })
        .collect()
}
