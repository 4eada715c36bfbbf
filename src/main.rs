//! routechain demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────────▶ http::server (axum fallback, body buffering)
//!                              │ spawn_blocking
//!                              ▼
//!                        dispatch::Dispatcher ──▶ routing::Router::find_routes
//!                              │                    (method bucket ∪ ALL bucket)
//!                              ▼
//!                        RouteContext::next() ──▶ interceptor ──▶ handler
//!                              │
//!                              ▼
//!                        auto-commit / 404, finally routes
//!     Client Response          │
//!     ◀────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use routechain::config::{load_config, AppConfig};
use routechain::observability::init_logging;
use routechain::routing::RouteInfo;
use routechain::{demo, Dispatcher, HttpServer};

#[derive(Parser)]
#[command(name = "routechain")]
#[command(about = "Route chain demo server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the demo application (default)
    Serve,
    /// Print the demo route table as JSON
    Routes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Routes => print_routes(&config),
    }
}

async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&config.observability)?;

    tracing::info!("routechain v{} starting", env!("CARGO_PKG_VERSION"));

    let router = demo::router(&config.router)?;
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = router.len(),
        application_path = %router.application_path(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let dispatcher = Dispatcher::new(Arc::new(router));
    HttpServer::new(config, dispatcher).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_routes(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let router = demo::router(&config.router)?;
    let routes: Vec<RouteInfo> = router.routes().iter().map(|route| route.info()).collect();
    println!("{}", serde_json::to_string_pretty(&routes)?);
    Ok(())
}
