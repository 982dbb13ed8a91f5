//! gdetect - Command-line tool for the GLIMPS Detect file analysis API
//!
//! Submits files, waits for verdicts and looks up existing results.

mod commands;
mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use gdetect_client::{Client, Context, GdetectError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::SubmitArgs;
use crate::config::{Config, MergedConfig};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "gdetect")]
#[command(author, version, about = "GLIMPS Detect file analysis CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// GLIMPS Detect endpoint URL
    #[arg(short, long, env = "GDETECT_URL")]
    url: Option<String>,

    /// API token
    #[arg(short, long, env = "GDETECT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Configuration file path
    #[arg(short, long, env = "GDETECT_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a file for analysis and print its uuid
    Submit {
        /// File to submit
        file: PathBuf,

        #[command(flatten)]
        submit: SubmitArgs,
    },

    /// Get the result of a submission
    Get {
        /// Submission uuid
        uuid: String,

        /// Print the full analysis report
        #[arg(long)]
        full: bool,

        /// Also print the token and expert view URLs
        #[arg(long)]
        retrieve_urls: bool,
    },

    /// Get the latest result for a file hash
    Search {
        /// SHA256 of the file
        sha256: String,

        /// Also print the token and expert view URLs
        #[arg(long)]
        retrieve_urls: bool,
    },

    /// Submit a file and wait for its verdict
    Waitfor {
        /// File to submit
        file: PathBuf,

        #[command(flatten)]
        submit: SubmitArgs,

        /// Maximum time to wait, in seconds
        #[arg(long, default_value = "180")]
        timeout: u64,

        /// Interval between two polls, in milliseconds
        #[arg(long, default_value = "1000")]
        pull_time: u64,

        /// Also print the token and expert view URLs
        #[arg(long)]
        retrieve_urls: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let quiet = cli.quiet;
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let ctx = OutputContext::new(OutputFormat::Table, false, quiet);
            if is_cancelled(&e) {
                ctx.error("Cancelled");
            } else {
                ctx.error(&format!("Error: {:#}", e));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(
        cli.url.as_deref(),
        cli.token.as_deref(),
        cli.insecure,
        cli.output,
        cli.no_color,
    )?;

    // Create output context
    let ctx = OutputContext::new(merged.output, merged.no_color, cli.quiet);
    let client = create_client(&merged)?;

    // Ctrl-C cancels whatever is in flight
    let cancel = Context::background();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    // Execute command
    match &cli.command {
        Commands::Submit { file, submit } => {
            commands::submit(&client, &cancel, file, submit, &ctx).await?;
        }

        Commands::Get {
            uuid,
            full,
            retrieve_urls,
        } => {
            commands::get(&client, &cancel, uuid, *full, *retrieve_urls, &ctx).await?;
        }

        Commands::Search {
            sha256,
            retrieve_urls,
        } => {
            commands::search(&client, &cancel, sha256, *retrieve_urls, &ctx).await?;
        }

        Commands::Waitfor {
            file,
            submit,
            timeout,
            pull_time,
            retrieve_urls,
        } => {
            commands::waitfor(
                &client,
                &cancel,
                file,
                submit,
                Duration::from_secs(*timeout),
                Duration::from_millis(*pull_time),
                *retrieve_urls,
                &ctx,
            )
            .await?;
        }
    }

    Ok(())
}

/// Create a GLIMPS Detect client from the merged configuration
fn create_client(config: &MergedConfig) -> Result<Client> {
    Client::new(&config.url, &config.token, config.insecure, None)
        .context("Failed to create GLIMPS Detect client")
}

/// Whether the failure comes from a Ctrl-C
fn is_cancelled(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<GdetectError>()
            .is_some_and(|e| matches!(e, GdetectError::Cancelled))
    })
}
