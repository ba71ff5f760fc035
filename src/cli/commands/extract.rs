//! Extract command: read SD input into success and failure tables

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::shared::{CommandReport, TerminalProgress, prepare_config, setup_logging};
use crate::app::services::pipeline::{CollectingSink, Pipeline};
use crate::app::services::table_writer::TableWriter;
use crate::cli::args::ExtractArgs;
use crate::{Error, Result};

/// Run the extract command
///
/// Cancellation stops reading; the rows read so far are still written.
pub async fn run_extract(args: ExtractArgs, cancel: CancellationToken) -> Result<CommandReport> {
    setup_logging(&args.output)?;
    let report = extract(&args, cancel).await?;
    report.print(args.output.output_format)?;
    Ok(report)
}

/// Extraction without logging setup or printing
pub async fn extract(args: &ExtractArgs, cancel: CancellationToken) -> Result<CommandReport> {
    args.validate()?;
    let config = args.to_config()?;
    prepare_config(&config)?;
    let locations = config.input_locations()?;

    let progress = TerminalProgress::new(args.output.show_progress());
    let pipeline = Pipeline::new(config.clone())?
        .with_cancellation(cancel)
        .with_progress(progress.clone());

    let start = Instant::now();
    let (tables, status) = tokio::task::spawn_blocking(move || {
        let mut sink = CollectingSink::new();
        let status = pipeline.execute(&locations, &mut sink)?;
        Ok::<_, Error>((sink.into_tables(), status))
    })
    .await
    .map_err(|e| Error::io("Extraction task failed", std::io::Error::other(e)))??;
    progress.finish(&status.summary());

    if status.cancelled {
        info!("Extraction cancelled, writing the rows read so far");
    }
    let written =
        TableWriter::new(&args.output_dir, &args.table_name, args.format).write(&tables)?;

    if let Some(path) = &args.input.save_settings {
        config.save(path)?;
        info!("Saved settings to {}", path.display());
    }

    let mut report = CommandReport::new("extract", status, start.elapsed());
    report.tables = Some(written);
    Ok(report)
}
