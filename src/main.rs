//! ogg2mp3 command line
//!
//! `serve` hosts the handler as a bucket-notification webhook; `handle`
//! runs a single invocation for a notification read from a file or stdin.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ogg2mp3::config::{Config, LoggingConfig};
use ogg2mp3::config_file::generate_default_config;
use ogg2mp3::handler::Handler;
use ogg2mp3::http::create_router;
use ogg2mp3::state::AppState;
use ogg2mp3::store::build_store;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "ogg2mp3";

#[derive(Parser, Debug)]
#[command(name = "ogg2mp3")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Accept bucket notifications on POST /events
    Serve {
        /// Listen address, overrides the configuration
        #[arg(short, long)]
        listen: Option<String>,
    },
    /// Handle one notification and exit
    Handle {
        /// Notification JSON file, "-" for stdin
        #[arg(default_value = "-")]
        event: String,
    },
    /// Write a configuration file with every default
    InitConfig {
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Command::InitConfig { path } = &cli.command {
        return match generate_default_config(path) {
            Ok(()) => {
                println!("wrote {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("failed to write {}: {}", path.display(), e);
                ExitCode::FAILURE
            }
        };
    }

    // Loaded once; every invocation shares this value
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&LoggingConfig::default());
            tracing::error!("Configuration error: {}", e);
            return ExitCode::from(2);
        }
    };
    init_logging(&config.logging);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    tracing::info!(
        bitrate = %config.transcode.bitrate,
        encoder = %config.transcode.encoder.display(),
        "converting {} to {}",
        config.transcode.source_suffix,
        config.transcode.target_suffix
    );

    let store = match build_store(&config.store).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return ExitCode::from(2);
        }
    };
    tracing::info!("Object store backend: {}", store.name());

    let config = Arc::new(config);
    let handler = Handler::new(Arc::new(config.transcode.clone()), store);

    match cli.command {
        Command::Serve { listen } => {
            let addr = listen.unwrap_or_else(|| config.listen.clone());
            let state = Arc::new(AppState::new(config, handler));
            match serve(&addr, state).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!("Server error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Command::Handle { event } => handle_once(&event, &handler).await,
        Command::InitConfig { .. } => ExitCode::SUCCESS,
    }
}

/// Run the webhook server until interrupted
async fn serve(addr: &str, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let addr: std::net::SocketAddr = addr.parse()?;
    let app = create_router(state);

    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Run one invocation; the process exit code reports the outcome
async fn handle_once(source: &str, handler: &Handler) -> ExitCode {
    let payload = match read_event(source).await {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!("Failed to read event from {}: {}", source, e);
            return ExitCode::FAILURE;
        }
    };

    match handler.handle_payload(&payload).await {
        Ok(token) => {
            println!("{}", token);
            ExitCode::SUCCESS
        }
        // Already logged with bucket and key
        Err(_) => ExitCode::FAILURE,
    }
}

async fn read_event(source: &str) -> std::io::Result<Vec<u8>> {
    if source == "-" {
        let mut buf = Vec::new();
        tokio::io::stdin().read_to_end(&mut buf).await?;
        Ok(buf)
    } else {
        tokio::fs::read(source).await
    }
}

/// Initialize logging with tracing.
///
/// Logs go to stderr so `handle` can print its result on stdout.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            EnvFilter::try_new(format!(
                "ogg2mp3={level},tower_http={level}",
                level = logging.level
            ))
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
