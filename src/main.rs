/// Main entry point for the rs_webterm server
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use rs_webterm::app_state::AppState;
use rs_webterm::config::{ConfigLoader, init_logging};
use rs_webterm::server::{build_router, run_server_with_graceful_shutdown};

/// Serve interactive shell sessions over a WebSocket
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./config.toml when present)
    #[arg(short, long, env = "WEBTERM_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory with the UI bundle
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = ConfigLoader::new()
        .load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(static_dir) = cli.static_dir {
        config.server.static_dir = static_dir;
    }

    let _log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    let server_config = config.server.clone();
    let app_state = AppState::new(config);
    let app = build_router(app_state.clone());

    let result = run_server_with_graceful_shutdown(app, &server_config).await;

    let closed = app_state.sessions.close_all().await;
    info!("Closed {} terminal sessions on shutdown", closed);

    result.context("Server error")
}
