//! Tolk server entry point.

use anyhow::Result;
use clap::Parser;
use tolk::config::Settings;
use tolk::server::run_server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tolk - Speaker-attributed transcription server
#[derive(Parser, Debug)]
#[command(name = "tolk")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Address to bind (overrides configuration)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides configuration)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tolk={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    let host = cli.host.unwrap_or_else(|| settings.server.host.clone());
    let port = cli.port.unwrap_or(settings.server.port);

    run_server(&host, port, settings).await
}
