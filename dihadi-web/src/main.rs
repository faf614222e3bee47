//! Dihadi Web Server
//!
//! REST API of the daily-wage job marketplace.

use anyhow::Context;
use clap::Parser;
use dihadi_web::server::DihadiServerBuilder;
use dihadi_core::{init_logging, LogFormat, LoggingConfig};
use dihadi_web::WebConfig;

/// Dihadi Web Server - daily-wage job marketplace API
#[derive(Parser)]
#[command(name = "dihadi-web")]
#[command(about = "REST API for the Dihadi job marketplace")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database URL, e.g. sqlite://data/dihadi.db
    #[arg(long)]
    database_url: Option<String>,

    /// TOML file with session and token windows
    #[arg(long)]
    session_config: Option<std::path::PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format (compact, pretty, json)
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,

    /// Append logs to this file instead of stdout
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let logging = LoggingConfig {
        level: "warn".to_string(),
        format: args.log_format,
        log_file_path: args.log_file.clone(),
        filter_directives: vec![
            format!("dihadi_web={}", args.log_level),
            format!("dihadi_core={}", args.log_level),
            "tower_http=debug".to_string(),
        ],
        ..Default::default()
    };
    init_logging(&logging).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    // Environment first, command line arguments override
    let mut config = WebConfig::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.database_url.is_some() {
        config.database_url = args.database_url;
    }
    if let Some(path) = &args.session_config {
        config.session = dihadi_core::SessionWindows::from_file(path)
            .with_context(|| format!("Failed to load session config {}", path.display()))?;
    }

    tracing::info!(
        address = %config.address(),
        database = config.database_url.as_deref().unwrap_or("memory"),
        "Server configuration loaded"
    );

    let server = DihadiServerBuilder::with_config(config)
        .build()
        .await
        .context("Failed to build server")?;

    server.start().await.context("Server failed")?;
    Ok(())
}
