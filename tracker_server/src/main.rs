use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracker_core::{journal, logging, Config, Result, StorageBackend};

#[derive(Parser)]
#[command(name = "exercise-tracker")]
#[command(about = "Exercise logging service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(
        long,
        global = true,
        default_value = "info",
        value_parser = clap::builder::PossibleValuesParser::new(logging::LEVELS)
    )]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Keep users in memory only
        #[arg(long)]
        memory: bool,
    },

    /// Rewrite the user journal without malformed or orphaned records
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env(std::env::var("PORT").ok().as_deref())?;
            config
        }
        None => Config::load()?,
    };
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }

    match cli.command {
        Some(Commands::Serve { host, port, memory }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if memory {
                config.storage.backend = StorageBackend::Memory;
            }
            cmd_serve(config).await
        }
        Some(Commands::Compact) => cmd_compact(&config),
        None => cmd_serve(config).await,
    }
}

async fn cmd_serve(config: Config) -> Result<()> {
    let store = tracker_server::open_store(&config)?;
    let state = tracker_server::build_state(store, Arc::new(mockable::DefaultClock));
    let app = tracker_server::router(state);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    tracing::info!("Your app is listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

fn cmd_compact(config: &Config) -> Result<()> {
    let journal_path = config.storage.journal_path();

    if !journal_path.exists() {
        println!("No journal found - nothing to compact.");
        return Ok(());
    }

    let users = journal::compact(&journal_path)?;

    println!("✓ Compacted journal to {} users", users);
    println!("  Journal: {}", journal_path.display());
    Ok(())
}
