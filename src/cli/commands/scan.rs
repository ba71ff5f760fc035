//! Scan command: discover the properties present in SD input

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::shared::{CommandReport, TerminalProgress, prepare_config, setup_logging};
use crate::app::services::pipeline::Pipeline;
use crate::app::services::schema_discovery::SharedSchema;
use crate::cli::args::ScanArgs;
use crate::{Error, Result};

/// Run the scan command
pub async fn run_scan(args: ScanArgs, cancel: CancellationToken) -> Result<CommandReport> {
    setup_logging(&args.output)?;
    let report = scan(&args, cancel).await?;
    report.print(args.output.output_format)?;
    Ok(report)
}

/// Discovery without logging setup or printing
///
/// With `--save-settings`, the discovered list is stored as a fixed property
/// request so later extractions can skip discovery.
pub async fn scan(args: &ScanArgs, cancel: CancellationToken) -> Result<CommandReport> {
    args.validate()?;
    let config = args.to_config()?;
    prepare_config(&config)?;
    let locations = config.input_locations()?;

    let progress = TerminalProgress::new(args.output.show_progress());
    let pipeline = Pipeline::new(config.clone())?
        .with_predictor(None)
        .with_cancellation(cancel)
        .with_progress(progress.clone());

    let start = Instant::now();
    let schema = SharedSchema::new();
    let outcome = tokio::task::spawn_blocking(move || pipeline.discover(&locations, &schema))
        .await
        .map_err(|e| Error::io("Scan task failed", std::io::Error::other(e)))??;
    progress.finish(&outcome.status.summary());

    if let Some(path) = &args.input.save_settings {
        config
            .with_properties(outcome.properties.clone())
            .save(path)?;
        info!("Saved {} properties to {}", outcome.properties.len(), path.display());
    }

    let mut report = CommandReport::new("scan", outcome.status, start.elapsed());
    report.properties = Some(outcome.properties);
    Ok(report)
}
