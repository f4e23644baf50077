// Entrypoint for the batch uploader.
// - Parses the four positional arguments and reads configuration from the
//   environment.
// - Runs the batch and turns the outcome into a process exit code.

use anyhow::Context;
use clap::Parser;
use holo_batch_upload::api::UploadClient;
use holo_batch_upload::batch::{BatchOutcome, BatchRunner};
use holo_batch_upload::config::Config;
use holo_batch_upload::error::{BatchError, EXIT_NO_ROWS};
use holo_batch_upload::row::Identity;
use holo_batch_upload::ui;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Batch upload holograms described in a CSV file.
#[derive(Parser, Debug)]
#[command(name = "holo-batch-upload")]
#[command(version, about)]
struct Args {
    /// Your API key
    api_key: String,

    /// Your security key. Only if enabled through the security page
    security_key: String,

    /// Your user email
    email: String,

    /// A csv file containing all other arguments for the POST body, one upload per row
    body_args: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "holo_batch_upload=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let code = run(args)?;
    std::process::exit(code);
}

fn run(args: Args) -> anyhow::Result<i32> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            let err = BatchError::from(err);
            ui::print_error(&err);
            return Ok(err.exit_code());
        }
    };
    let client = UploadClient::new(config.upload_url.clone()).context("Failed to create upload client")?;
    info!(url = %client.upload_url(), csv = %args.body_args.display(), "batch upload");
    let identity = Identity {
        api_key: args.api_key,
        security_key: args.security_key,
        email: args.email,
    };
    let runner = BatchRunner::new(&config, identity, client)
        .with_progress(ui::upload_progress(0))
        .with_preview(true);

    match runner.run(&args.body_args) {
        Ok(BatchOutcome::Completed(report)) => {
            ui::print_summary(&report);
            Ok(report.exit_code())
        }
        Ok(BatchOutcome::NoRows) => {
            ui::print_no_rows();
            Ok(EXIT_NO_ROWS)
        }
        Err(err) => {
            debug!(code = err.exit_code(), "batch aborted: {}", err);
            ui::print_error(&err);
            Ok(err.exit_code())
        }
    }
}
