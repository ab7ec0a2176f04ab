//! CLI entry point for the arrivals board.
//!
//! `serve` runs the refresh loop and the HTTP query interface; `show` runs a
//! single cycle and prints the board.

use std::ffi::OsStr;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrivals_board::config::{BoardArgs, BoardConfig};
use arrivals_board::fetch::auth::ApiKey;
use arrivals_board::fetch::{BasicClient, HttpClient};
use arrivals_board::output::{render_board, render_json};
use arrivals_board::reference::ReferenceStore;
use arrivals_board::refresh::Refresher;
use arrivals_board::snapshot::SnapshotStore;
use arrivals_board::web::{AppState, create_router};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "arrivals_board")]
#[command(about = "Live subway arrivals for a fixed set of stops", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the board periodically and serve it over HTTP
    Serve {
        #[command(flatten)]
        board: BoardArgs,

        /// Address to listen on
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5001")]
        bind: SocketAddr,
    },
    /// Run a single refresh cycle and print the board
    Show {
        #[command(flatten)]
        board: BoardArgs,

        /// Feed URLs or local .pb files to use instead of the configured feeds
        #[arg(value_name = "FILE_OR_URL")]
        sources: Vec<String>,

        /// Print the JSON payload instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_logging()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { board, bind } => {
            serve(board.into_config()?, bind).await?;
        }
        Commands::Show {
            board,
            sources,
            json,
        } => {
            let mut config = board.into_config()?;
            if !sources.is_empty() {
                config.feed_urls = sources;
            }
            show(config, json).await?;
        }
    }

    Ok(())
}

/// Colored stderr plus a JSON rolling log file.
fn init_logging() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/arrivals_board.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("arrivals_board.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// HTTP client for the feeds, with the API key header when one is configured.
fn build_client(config: &BoardConfig) -> Result<Arc<dyn HttpClient>> {
    let basic = BasicClient::with_timeout(config.feed_timeout)?;
    match &config.api_key {
        Some(key) => {
            let client =
                ApiKey::mta(basic, key).context("MTA_API_KEY is not a valid header value")?;
            Ok(Arc::new(client))
        }
        None => Ok(Arc::new(basic)),
    }
}

#[tracing::instrument(skip(config), fields(sources = config.feed_urls.len()))]
async fn serve(config: BoardConfig, bind: SocketAddr) -> Result<()> {
    let client = build_client(&config)?;

    // Without station names there is nothing meaningful to show
    let references = Arc::new(ReferenceStore::new(&config.stops_file, &config.trips_file));
    let tables = references
        .get()
        .await
        .context("failed to load stop names")?;
    info!(stops = tables.stop_count(), "Reference data ready");

    let store = SnapshotStore::new();
    let refresher = Arc::new(Refresher::new(client, config, references, store.clone()));
    tokio::spawn(refresher.run_forever());

    let app = create_router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(addr = %bind, "Arrivals board listening");
    info!("  GET /api/data - current board");
    info!("  GET /health   - health check");

    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument(skip(config), fields(sources = config.feed_urls.len()))]
async fn show(config: BoardConfig, json: bool) -> Result<()> {
    let client = build_client(&config)?;
    let references = Arc::new(ReferenceStore::new(&config.stops_file, &config.trips_file));
    let store = SnapshotStore::new();
    let refresher = Refresher::new(client, config, references, store.clone());

    let stats = refresher.run_cycle().await?;
    info!(
        sources_ok = stats.sources_ok,
        sources_failed = stats.sources_failed,
        arrivals = stats.arrivals,
        "Cycle complete"
    );

    let snapshot = store.read().await;
    if json {
        println!("{}", render_json(&snapshot)?);
    } else {
        print!("{}", render_board(&snapshot));
    }

    Ok(())
}
