use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use medledger_core::config::{flag_from_env_value, reference_validation_from_env_value};
use medledger_core::constants::{DEFAULT_LEDGER_NAME, DEFAULT_LOG_FILTER, DEFAULT_REST_ADDR};
use medledger_core::{CollectionRegistry, CoreConfig, InMemoryLedger};

/// Main entry point for the MedLedger server
///
/// Loads configuration from the environment, opens the ledger and serves the REST API
/// (with OpenAPI/Swagger UI) until interrupted.
///
/// # Environment Variables
/// - `MEDLEDGER_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MEDLEDGER_NAME`: Ledger (channel) name (default: "medledger.dev")
/// - `MEDLEDGER_REFERENCE_VALIDATION`: "disabled" (default) or "enforced"
/// - `MEDLEDGER_LEDGER_FILE`: Snapshot file to load at startup and rewrite after each commit;
///   the ledger is memory-only if unset
/// - `MEDLEDGER_SEED`: When true, seeds every collection with its sample records
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a configuration value is invalid,
/// - the ledger snapshot file cannot be read,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(DEFAULT_LOG_FILTER.parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("MEDLEDGER_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let ledger_name =
        std::env::var("MEDLEDGER_NAME").unwrap_or_else(|_| DEFAULT_LEDGER_NAME.into());
    let reference_validation =
        reference_validation_from_env_value(std::env::var("MEDLEDGER_REFERENCE_VALIDATION").ok())?;
    let seed = flag_from_env_value(std::env::var("MEDLEDGER_SEED").ok())?;

    let cfg = Arc::new(CoreConfig::new(ledger_name, reference_validation)?);

    let ledger = match std::env::var("MEDLEDGER_LEDGER_FILE")
        .ok()
        .filter(|v| !v.trim().is_empty())
    {
        Some(path) => InMemoryLedger::open(path)?,
        None => InMemoryLedger::new(),
    };

    if seed {
        let seeded = CollectionRegistry::new(cfg.clone()).seed_all(&ledger)?;
        tracing::info!(?seeded, "seeded sample records");
    }

    let state = AppState::new(cfg.clone(), ledger)?;

    tracing::info!(
        ledger = cfg.ledger_name(),
        reference_validation = ?cfg.reference_validation(),
        height = state.ledger().height()?,
        "++ Starting MedLedger REST on {}",
        rest_addr
    );

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("-- Shutting down MedLedger REST");
}
