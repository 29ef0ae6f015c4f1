//! source-fetch: run one source descriptor through the ingestion pipeline.
//!
//! Reads a descriptor as JSON (file path, or `-` for stdin), fetches it and
//! prints `{"data": ..., "ledger": [...]}` on stdout. A `null` descriptor
//! is accepted and reported as a validation error in the ledger.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tracing::info;

use cockpit_core::config::load_dotenv;
use cockpit_core::{Config, ExecutionLedger, SourceDescriptor, StepStatus};
use cockpit_ingest::SourceFetcher;

// ── CLI ─────────────────────────────────────────────────────────────

/// Fetch a cockpit data source and print the data with its execution ledger.
#[derive(Parser, Debug)]
#[command(name = "source-fetch", version, about)]
struct Cli {
    /// Descriptor JSON file, or `-` to read stdin.
    #[arg(default_value = "-")]
    descriptor: PathBuf,

    /// Pretty-print the JSON output.
    #[arg(long, env = "SOURCE_FETCH_PRETTY")]
    pretty: bool,

    /// Exit with status 1 when the last ledger step is an error.
    #[arg(long)]
    fail_on_error: bool,
}

fn read_descriptor(path: &Path) -> anyhow::Result<Option<SourceDescriptor>> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read descriptor from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read descriptor {}", path.display()))?
    };
    serde_json::from_str(&raw).context("descriptor is not a valid source JSON object")
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    let descriptor = read_descriptor(&cli.descriptor)?;
    let fetcher = SourceFetcher::from_config(&config);

    let mut ledger = ExecutionLedger::new();
    let data = fetcher
        .fetch_source_data(descriptor.as_ref(), &mut ledger)
        .await;

    let failed = ledger
        .last()
        .is_some_and(|step| step.status == StepStatus::Error);
    info!(steps = ledger.len(), has_data = data.is_some(), failed, "source fetch finished");

    let output = json!({ "data": data, "ledger": ledger });
    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");

    if cli.fail_on_error && failed {
        std::process::exit(1);
    }
    Ok(())
}
