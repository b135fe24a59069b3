//! # voicehubd: voicehub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Load the registry and optionally seed it from an import file
//! - Start the grammar worker, warmed from the artifact cache
//! - Build the axum router, injecting application services
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;
mod dispatch;

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use voicehub_adapter_http_axum::state::AppState;
use voicehub_adapter_storage_sqlite_sqlx::{
    Config as DatabaseConfig, SqliteArtifactCache, SqliteRegistryRepository,
};
use voicehub_app::grammar_worker::GrammarWorker;
use voicehub_app::ports::RegistryRepository;
use voicehub_app::services::command_service::CommandService;
use voicehub_app::services::registry_service::{ImportedDevice, RegistryService};

use crate::config::Config;
use crate::dispatch::LogDispatcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let filter = EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {:?}: {err}", config.logging.filter);
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Database
    let db = DatabaseConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Registry
    let repo = SqliteRegistryRepository::new(pool.clone());
    let registry = Arc::new(RegistryService::load(repo).await?);
    if let Some(path) = &config.import.seed_file {
        seed(&*registry, path).await?;
    }

    // Grammar
    let (grammar, worker) = GrammarWorker::spawn(
        SqliteArtifactCache::new(pool),
        registry.subscribe(),
        config.grammar_worker(),
    );

    // Commands
    let commands = CommandService::new(
        grammar.clone(),
        LogDispatcher,
        config.dispatch_timeout(),
    );

    // HTTP
    let state = AppState::new(registry, grammar, commands);
    let app = voicehub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "voicehubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned the last registry sender, so the worker stops on its own.
    if let Err(err) = worker.await {
        tracing::warn!(error = %err, "grammar worker ended abnormally");
    }
    tracing::info!("voicehubd stopped");
    Ok(())
}

async fn seed<R: RegistryRepository>(
    registry: &RegistryService<R>,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(path).await?;
    let batch: Vec<ImportedDevice> = serde_json::from_str(&content)?;
    let report = registry.import(batch).await?;
    tracing::info!(
        path = %path.display(),
        created = report.created.len(),
        updated = report.updated.len(),
        unclassified = report.unclassified.len(),
        "seed import applied"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
