use clap::Parser;
use schoolfinder_api::{AppState, RestApi};
use schoolfinder_core::{MatchLimits, RetryPolicy, SchoolMatcher};
use schoolfinder_storage::SchoolStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// School directory search service
#[derive(Parser, Debug)]
#[command(name = "schoolfinder")]
#[command(about = "Search, rank and compare schools", long_about = None)]
struct Args {
    /// JSON snapshot holding the school documents
    #[arg(short, long, default_value = "./data/schools.json")]
    data_file: PathBuf,

    /// HTTP API port
    #[arg(long, default_value_t = 8080)]
    http_port: u16,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Attempts per storage read before giving up
    #[arg(long, default_value_t = 5)]
    retry_attempts: u32,

    /// Base retry delay; attempt k waits k times this
    #[arg(long, default_value_t = 2000)]
    retry_base_delay_ms: u64,

    /// Candidates fetched per interactive search
    #[arg(long, default_value_t = 20)]
    candidate_pool: usize,

    /// Maximum results returned by a search
    #[arg(long, default_value_t = 10)]
    result_cap: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting schoolfinder v{}", env!("CARGO_PKG_VERSION"));
    info!("Data file: {:?}", args.data_file);
    info!("HTTP API port: {}", args.http_port);

    let store = Arc::new(SchoolStore::open(&args.data_file)?);
    info!("Store initialized with {} schools", store.len());

    let limits = MatchLimits {
        candidate_pool: args.candidate_pool,
        result_cap: args.result_cap,
        ..MatchLimits::default()
    };
    let retry = RetryPolicy::new(
        args.retry_attempts,
        Duration::from_millis(args.retry_base_delay_ms),
    );
    let matcher = SchoolMatcher::new(store.clone())
        .with_limits(limits)
        .with_retry(retry);
    let state = Arc::new(AppState::with_matcher(store, matcher));

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, http_port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("schoolfinder started successfully");
    info!("HTTP API: http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
