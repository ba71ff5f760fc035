use anyhow::Context;
use clap::{CommandFactory, Parser};
use sdf_extractor::cli::commands::shared::is_critical_error;
use sdf_extractor::cli::{args::Args, commands};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Without a subcommand, show help
    let Some(command) = args.command else {
        let _ = Args::command().print_help();
        println!();
        process::exit(0);
    };

    if let Err(error) = run(command) {
        eprintln!("Error: {:#}", error);
        // Invalid setup exits with 2, failures during a run with 1
        let critical = error
            .downcast_ref::<sdf_extractor::Error>()
            .is_some_and(is_critical_error);
        process::exit(if critical { 2 } else { 1 });
    }
}

fn run(command: sdf_extractor::cli::args::Commands) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

    let report = runtime.block_on(async {
        // Ctrl-C cancels cooperatively; the command still writes what it has read
        let cancellation_token = CancellationToken::new();
        let signal_token = cancellation_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nReceived CTRL+C, finishing the current record...");
                signal_token.cancel();
            }
        });

        commands::run(command, cancellation_token).await
    })?;

    if report.status.cancelled {
        process::exit(130);
    }
    Ok(())
}
