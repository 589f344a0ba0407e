//! tdexport CLI
//!
//! Command-line interface for exporting Teradata tables with FastExport

use clap::Parser;
use tdexport::cli::{Cli, Runner};
use tdexport::process::CancellationToken;
use tracing::Level;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    let runner = Runner::new(cli);
    let result = tokio::task::spawn_blocking(move || runner.run(&cancel)).await;

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: export task failed: {e}");
            std::process::exit(1);
        }
    }
}
