//! Tests for pipeline orchestration

use std::io::{self, BufRead, Read};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use super::*;
use crate::Error;
use crate::app::models::{Cell, OutputRow, PropertyKind, TableSpec};
use crate::app::services::pipeline::{
    CollectingSink, ExtractedTables, Pipeline, ProgressReporter, RowSink, RunStatus,
    SchemaStrategy,
};
use crate::app::services::schema_discovery::SharedSchema;
use crate::config::PropertyRequest;

fn run(config: ReaderConfig, locations: &[InputLocation]) -> (ExtractedTables, RunStatus) {
    let pipeline = Pipeline::new(config).unwrap();
    let mut sink = CollectingSink::new();
    let status = pipeline.execute(locations, &mut sink).unwrap();
    (sink.into_tables(), status)
}

/// Test that an empty location list is rejected before any reading
#[test]
fn test_no_locations_is_configuration_error() {
    let pipeline = Pipeline::new(bare_config()).unwrap();
    let mut sink = CollectingSink::new();
    let err = pipeline.execute(&[], &mut sink).unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}

/// Test counts too large to address only fail their own record
#[test]
fn test_overflowing_counts_are_isolated() {
    let data = format!(
        "{}{}{}",
        v2000_entry("A", 1, 0, &[]),
        "Huge\n\n\n1 18446744073709551615\nM  END\n$$$$\n",
        v2000_entry("B", 1, 0, &[])
    );
    let config = ReaderConfig {
        extract_name: true,
        extract_atom_bond_counts: true,
        ..bare_config()
    };

    let (tables, status) = run(config, &[memory("mem", &data)]);

    assert_eq!(status.records_attempted, 3);
    assert_eq!(tables.successes.len(), 2);
    assert_eq!(tables.failures.len(), 1);
    assert_eq!(tables.successes[1].cells[0], Cell::Text("B".to_string()));
    assert_eq!(tables.successes[1].cells[1], Cell::Integer(1));
    assert!(tables.failures[0].error_message.contains("exceed record length"));
}

/// Test a malformed record between good ones is isolated
#[test]
fn test_bad_record_isolation() {
    let data = format!(
        "{}{}{}{}",
        v2000_entry("A", 1, 0, &[]),
        broken_entry("Bad"),
        v2000_entry("B", 1, 0, &[]),
        v2000_entry("C", 1, 0, &[])
    );
    let config = ReaderConfig {
        extract_name: true,
        ..bare_config()
    };

    let (tables, status) = run(config, &[memory("mem", &data)]);

    assert_eq!(tables.successes.len(), 3);
    assert_eq!(tables.failures.len(), 1);
    let titles: Vec<&Cell> = tables.successes.iter().map(|r| &r.cells[0]).collect();
    assert_eq!(
        titles,
        vec![
            &Cell::Text("A".to_string()),
            &Cell::Text("B".to_string()),
            &Cell::Text("C".to_string())
        ]
    );
    assert_eq!(tables.failures[0].key, "Row1");
    assert!(tables.failures[0].raw_text.starts_with("Bad\n"));
    assert!(!tables.failures[0].raw_text.contains("$$$$"));
    assert_eq!(status.records_attempted, 4);
    assert_eq!(status.warning.as_deref(), Some("Failed to parse 1 record(s)"));
}

/// Test the record limit counts successes and failures together, across locations
#[test]
fn test_record_limit_is_exact() {
    let first = format!("{}{}", v2000_entry("A", 1, 0, &[]), broken_entry("Bad"));
    let second = format!("{}{}", v2000_entry("B", 1, 0, &[]), v2000_entry("C", 1, 0, &[]));
    let locations = [memory("one", &first), memory("two", &second)];

    for limit in 1..=5 {
        let (tables, status) = run(bare_config().with_record_limit(limit), &locations);
        let produced = tables.successes.len() + tables.failures.len();
        assert_eq!(produced, limit.min(4), "limit {}", limit);
        assert_eq!(status.records_attempted, limit.min(4));
    }

    let (_, status) = run(bare_config().with_record_limit(3), &locations);
    assert!(status.limit_reached);
}

/// Test discovery widens Integer to Float and coerces earlier values
#[test]
fn test_discovery_widening_scenario() {
    let data = format!(
        "{}{}",
        v2000_entry("A", 1, 0, &[("Weight", "100")]),
        v2000_entry("B", 1, 0, &[("Weight", "100.5")])
    );
    let (tables, _) = run(bare_config().with_discovery(), &[memory("mem", &data)]);

    assert_eq!(tables.success_spec.columns[0].name, "Weight");
    assert_eq!(tables.success_spec.columns[0].kind, PropertyKind::Float);
    assert_eq!(tables.successes[0].cells[0], Cell::Float(100.0));
    assert_eq!(tables.successes[1].cells[0], Cell::Float(100.5));
}

/// Test the counts-line failure scenario with discovery enabled
#[test]
fn test_counts_line_failure_scenario() {
    let data = format!(
        "{}MolB\n\n\nbroken\nM  END\n> <LogD>\ntext\n\n$$$$\n",
        v2000_entry("MolA", 3, 2, &[("LogD", "1.5")])
    );
    let config = ReaderConfig {
        extract_name: true,
        extract_atom_bond_counts: true,
        ..bare_config()
    }
    .with_discovery();

    let (tables, status) = run(config, &[memory("mem", &data)]);

    assert_eq!(
        tables.success_spec.names(),
        vec!["Molecule name", "Atom count", "Bond count", "LogD"]
    );
    assert_eq!(tables.success_spec.columns[3].kind, PropertyKind::Float);
    assert_eq!(
        tables.successes[0].cells,
        vec![
            Cell::Text("MolA".to_string()),
            Cell::Integer(3),
            Cell::Integer(2),
            Cell::Float(1.5)
        ]
    );
    assert_eq!(tables.failures.len(), 1);
    assert!(tables.failures[0].raw_text.starts_with("MolB"));
    assert!(tables.failures[0].error_message.contains("counts line"));
    assert_eq!(status.records_failed, 1);
}

/// Test discovery followed by build is deterministic
#[test]
fn test_repeated_runs_are_identical() {
    let data = format!(
        "{}{}{}",
        v2000_entry("A", 2, 1, &[("X", "1"), ("Y", "a")]),
        broken_entry("Bad"),
        v2000_entry("B", 1, 0, &[("Z", "2.5"), ("X", "3.5")])
    );
    let config = bare_config().with_discovery();

    let (first, _) = run(config.clone(), &[memory("mem", &data)]);
    let (second, _) = run(config, &[memory("mem", &data)]);
    assert_eq!(first, second);
    assert_eq!(first.success_spec.names(), vec!["X", "Y", "Z"]);
}

/// Test fixed schemas are read in a single pass with declared kinds
#[test]
fn test_fixed_schema() {
    let data = v2000_entry("A", 1, 0, &[("Id", "12"), ("Other", "x")]);
    let config = bare_config().with_properties(vec![
        PropertyRequest::new("Id", true, PropertyKind::Text),
        PropertyRequest::new("Missing", true, PropertyKind::Float),
    ]);

    let (tables, _) = run(config, &[memory("mem", &data)]);
    assert_eq!(
        tables.successes[0].cells,
        vec![Cell::Text("12".to_string()), Cell::Missing]
    );
}

/// Test source tags follow the location currently being read
#[test]
fn test_source_location_column() {
    let locations = [
        memory("first.sdf", &v2000_entry("A", 1, 0, &[])),
        memory("second.sdf", &format!("{}{}", v2000_entry("B", 1, 0, &[]), broken_entry("C"))),
    ];
    let (tables, status) = run(bare_config().with_source_location_column(), &locations);

    assert_eq!(tables.successes[0].cells, vec![Cell::Text("first.sdf".to_string())]);
    assert_eq!(tables.successes[1].cells, vec![Cell::Text("second.sdf".to_string())]);
    assert_eq!(tables.failures[0].source_location.as_deref(), Some("second.sdf"));
    assert_eq!(tables.failures[0].key, "Row2");
    assert_eq!(status.locations_read, 2);
}

/// Sink that cancels the run after a number of rows
struct CancellingSink {
    inner: CollectingSink,
    token: CancellationToken,
    cancel_after: usize,
}

impl RowSink for CancellingSink {
    fn begin(&mut self, success_spec: &TableSpec, failure_spec: &TableSpec) -> crate::Result<()> {
        self.inner.begin(success_spec, failure_spec)
    }

    fn push(&mut self, row: OutputRow) -> crate::Result<()> {
        self.inner.push(row)?;
        if self.inner.tables().successes.len() >= self.cancel_after {
            self.token.cancel();
        }
        Ok(())
    }
}

/// Test cancellation stops promptly and keeps rows already produced
#[test]
fn test_cancellation_keeps_partial_rows() {
    let data: String = (0..10)
        .map(|i| v2000_entry(&format!("M{}", i), 1, 0, &[]))
        .collect();
    let token = CancellationToken::new();
    let pipeline = Pipeline::new(bare_config())
        .unwrap()
        .with_cancellation(token.clone());

    let mut sink = CancellingSink {
        inner: CollectingSink::new(),
        token: token.clone(),
        cancel_after: 3,
    };
    let status = pipeline.execute(&[memory("mem", &data)], &mut sink).unwrap();

    assert!(status.cancelled);
    assert_eq!(status.records_attempted, 3);
    assert_eq!(sink.inner.tables().successes.len(), 3);

    // Cancelling a finished run again is harmless
    token.cancel();
    assert!(token.is_cancelled());
}

/// Test a cancelled token stops discovery before any row is built
#[test]
fn test_cancelled_before_start() {
    let token = CancellationToken::new();
    token.cancel();
    let pipeline = Pipeline::new(bare_config().with_discovery())
        .unwrap()
        .with_cancellation(token);

    let mut sink = CollectingSink::new();
    let status = pipeline
        .execute(&[memory("mem", &v2000_entry("A", 1, 0, &[]))], &mut sink)
        .unwrap();

    assert!(status.cancelled);
    assert_eq!(status.records_attempted, 0);
    assert!(sink.tables().successes.is_empty());
}

/// Reporter that cancels the run after a number of progress updates
struct CancellingProgress {
    token: CancellationToken,
    cancel_after: usize,
    reports: Mutex<usize>,
}

impl ProgressReporter for CancellingProgress {
    fn report(&self, _fraction: Option<f64>, _message: &str) {
        let mut reports = self.reports.lock().unwrap();
        *reports += 1;
        if *reports >= self.cancel_after {
            self.token.cancel();
        }
    }
}

/// Test a discovery cancelled midway keeps its reading totals but builds no rows
#[test]
fn test_cancelled_discovery_keeps_reading_totals() {
    let data: String = (0..6)
        .map(|i| v2000_entry(&format!("M{}", i), 1, 0, &[("P", "1")]))
        .chain(std::iter::once(broken_entry("Bad")))
        .collect();
    let token = CancellationToken::new();
    let progress = Arc::new(CancellingProgress {
        token: token.clone(),
        cancel_after: 2,
        reports: Mutex::new(0),
    });
    let pipeline = Pipeline::new(bare_config().with_discovery())
        .unwrap()
        .with_cancellation(token)
        .with_progress(progress);

    let mut sink = CollectingSink::new();
    let status = pipeline.execute(&[memory("mem", &data)], &mut sink).unwrap();

    assert!(status.cancelled);
    assert_eq!(status.records_attempted, 2);
    assert_eq!(status.locations_read, 1);
    assert!(status.bytes_read > 0);
    assert_eq!(status.records_succeeded, 0);
    assert_eq!(status.records_failed, 0);
    assert!(status.warning.is_none());
    assert!(sink.tables().successes.is_empty());
    assert!(sink.tables().failures.is_empty());
}

/// Reader failing after the first record
struct FailingAfterFirst {
    data: io::Cursor<Vec<u8>>,
}

impl Read for FailingAfterFirst {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.data.read(buf)?;
        if n == 0 {
            Err(io::Error::other("device unplugged"))
        } else {
            Ok(n)
        }
    }
}

/// Test I/O failures abort the run with the cause attached
#[test]
fn test_io_failure_aborts_run() {
    use crate::app::services::sdf_parser::RecordSplitter;

    // The splitter surfaces the read error as an Io error
    let reader: Box<dyn BufRead> = Box::new(io::BufReader::new(FailingAfterFirst {
        data: io::Cursor::new(v2000_entry("A", 1, 0, &[]).into_bytes()),
    }));
    let mut splitter = RecordSplitter::new(reader);
    assert!(splitter.next_record().unwrap().is_some());
    assert!(matches!(splitter.next_record(), Err(Error::Io { .. })));

    // A missing file aborts the pipeline run
    let missing = InputLocation::parse("/no/such/input.sdf").unwrap();
    let pipeline = Pipeline::new(bare_config()).unwrap();
    let mut sink = CollectingSink::new();
    let err = pipeline
        .execute(&[memory("ok", &v2000_entry("A", 1, 0, &[])), missing], &mut sink)
        .unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
    assert_eq!(sink.tables().successes.len(), 1);
}

#[derive(Default)]
struct ProgressLog {
    fractions: Mutex<Vec<Option<f64>>>,
}

impl ProgressReporter for ProgressLog {
    fn report(&self, fraction: Option<f64>, _message: &str) {
        self.fractions.lock().unwrap().push(fraction);
    }
}

/// Test progress spans both passes and never decreases
#[test]
fn test_progress_over_two_passes() {
    let data: String = (0..4)
        .map(|i| v2000_entry(&format!("M{}", i), 1, 0, &[("P", "1")]))
        .collect();
    let log = Arc::new(ProgressLog::default());
    let pipeline = Pipeline::new(bare_config().with_discovery())
        .unwrap()
        .with_progress(log.clone());

    let mut sink = CollectingSink::new();
    pipeline.execute(&[memory("mem", &data)], &mut sink).unwrap();

    let fractions: Vec<f64> = log
        .fractions
        .lock()
        .unwrap()
        .iter()
        .map(|f| f.unwrap())
        .collect();
    assert_eq!(fractions.len(), 8);
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert!((fractions[3] - 0.5).abs() < 1e-9);
    assert!((fractions[7] - 1.0).abs() < 1e-9);
}

/// Test standalone discovery publishes into the shared schema
#[test]
fn test_standalone_discovery() {
    let data = format!(
        "{}{}",
        v2000_entry("A", 1, 0, &[("LogD", "1.5"), ("Name", "x")]),
        v2000_entry("B", 1, 0, &[("LogD", "2")])
    );
    let shared = SharedSchema::new();
    let observer = shared.clone();
    let pipeline = Pipeline::new(bare_config()).unwrap();

    let outcome = pipeline.discover(&[memory("mem", &data)], &shared).unwrap();

    assert_eq!(outcome.properties.len(), 2);
    assert_eq!(outcome.properties[0].kind, PropertyKind::Float);
    assert!(outcome.properties.iter().all(|p| p.extract));
    assert_eq!(observer.snapshot().records_observed(), 2);
    assert_eq!(outcome.status.records_attempted, 2);
}

/// Test an explicit strategy overrides the configuration
#[test]
fn test_explicit_fixed_strategy() {
    let data = v2000_entry("A", 1, 0, &[("LogD", "1.5")]);
    let pipeline = Pipeline::new(bare_config().with_discovery()).unwrap();
    let mut sink = CollectingSink::new();

    pipeline
        .execute_with(
            SchemaStrategy::Fixed(vec![PropertyRequest::new("LogD", true, PropertyKind::Text)]),
            &[memory("mem", &data)],
            &mut sink,
        )
        .unwrap();

    assert_eq!(sink.tables().success_spec.columns[0].kind, PropertyKind::Text);
}
