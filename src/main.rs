//! Tabledrop server binary - upload tabular data, query it over HTTP

use clap::Parser;
use std::path::PathBuf;
use tabledrop::config::{self, ServerConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "tabledrop")]
#[command(version = "0.1.0")]
#[command(about = "Upload tabular datasets (SQLite or CSV) and run read-only SQL against them")]
#[command(long_about = r#"
Tabledrop accepts SQLite database files and CSV files over HTTP, stores them
under a generated uuid, and serves read-only queries against them:

  POST /upload-file         multipart upload, returns {"uuid": ...}
  POST /execute-query       {"uuid", "query"} -> {"results": [[...], ...]}
  GET  /get-schema/<uuid>   tables, DDL, and example rows

Artifacts older than the retention window are deleted by a background sweep.

Example usage:
  tabledrop --port 3001 --upload-dir uploads
  tabledrop --config tabledrop.toml --retention-secs 7200
"#)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory where uploaded artifacts are stored
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Seconds an artifact is retained before the sweep deletes it
    #[arg(long)]
    retention_secs: Option<u64>,

    /// Seconds between retention sweeps
    #[arg(long)]
    sweep_interval_secs: Option<u64>,

    /// Filename the sweep never deletes
    #[arg(long)]
    exempt_file: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = resolve_config(&args)?;
    tracing::info!(
        upload_dir = %config.upload_dir.display(),
        port = config.port,
        "Resolved configuration"
    );

    tabledrop::server::start_server(config).await
}

/// Built-in defaults, overlaid by the config file, overlaid by CLI flags
fn resolve_config(args: &Args) -> anyhow::Result<ServerConfig> {
    let mut config = config::load_config(args.config.as_deref())?.unwrap_or_default();

    if let Some(dir) = &args.upload_dir {
        config.upload_dir = dir.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(secs) = args.retention_secs {
        config.retention_secs = secs;
    }
    if let Some(secs) = args.sweep_interval_secs {
        config.sweep_interval_secs = secs;
    }
    if let Some(name) = &args.exempt_file {
        config.exempt_file = Some(name.clone());
    }

    Ok(config)
}
