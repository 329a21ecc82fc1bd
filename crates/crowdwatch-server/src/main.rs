//! Service binary for Crowdwatch.
//!
//! Wires configuration, logging, the store of record, and the HTTP API
//! together, then serves until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `CROWDWATCH_CONFIG` or `crowdwatch-config.yaml`
//!    (defaults when the file is absent), then apply environment overrides
//! 2. Initialize structured logging (tracing)
//! 3. Validate configuration and build the decision engine
//! 4. Open the store: `PostgreSQL` when `database.url` is set, otherwise
//!    in-memory
//! 5. Seed the configured locations (idempotent)
//! 6. Serve the HTTP API

mod error;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crowdwatch_api::{AdminAuth, AppState, ServerConfig};
use crowdwatch_core::OccupancyService;
use crowdwatch_core::config::{LoggingConfig, ServiceConfig};
use crowdwatch_db::{MemoryStore, OccupancyStore, PgStore, PostgresConfig, PostgresPool};
use crowdwatch_decision::DecisionEngine;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::StartupError;

/// Config file used when `CROWDWATCH_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "crowdwatch-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step fails or the server
/// cannot bind.
#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // 1. Load configuration.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging)?;
    info!(config = %source, "crowdwatch-server starting");

    // 3. Validate and build the engine.
    config.validate()?;
    let engine = Arc::new(config.decision_engine()?);
    info!(
        locations = config.locations.len(),
        warning_percent = config.thresholds.warning_percent,
        "Configuration loaded"
    );

    // 4. Open the store and 5. seed it.
    match config.database.url.as_deref() {
        Some(url) => {
            let pool_config = PostgresConfig::new(url).with_pool(
                config.database.max_connections,
                Duration::from_secs(config.database.acquire_timeout_secs),
            );
            let pool = PostgresPool::connect(&pool_config).await?;
            pool.run_migrations().await?;
            let store = PgStore::new(pool.clone());
            let result = serve(&config, store, engine).await;
            pool.close().await;
            result
        }
        None => {
            info!("No database URL configured, using in-memory store");
            serve(&config, MemoryStore::new(), engine).await
        }
    }
}

/// Seed the store, assemble the state, and run the server.
async fn serve<S: OccupancyStore>(
    config: &ServiceConfig,
    store: S,
    engine: Arc<DecisionEngine>,
) -> Result<(), StartupError> {
    let seeded = store.seed(&config.locations).await?;
    info!(locations = seeded.len(), "Locations seeded");

    let service = OccupancyService::new(store, engine)
        .with_queries(config.queries)
        .with_forecast(config.forecast);
    let auth = AdminAuth::from_config(&config.auth);
    let state = Arc::new(AppState::new(service, auth));

    // 6. Serve.
    crowdwatch_api::start_server(&ServerConfig::from(&config.server), state).await?;
    info!("crowdwatch-server shutdown complete");
    Ok(())
}

/// Load configuration, returning it with a description of its source.
fn load_config() -> Result<(ServiceConfig, String), StartupError> {
    let path = std::env::var_os("CROWDWATCH_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    if path.exists() {
        let config = ServiceConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        let mut config = ServiceConfig::default();
        config.apply_env_overrides()?;
        Ok((config, String::from("defaults")))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
fn init_tracing(logging: &LoggingConfig) -> Result<(), StartupError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| StartupError::Logging {
            message: format!("invalid log filter: {e}"),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| StartupError::Logging {
        message: format!("{e}"),
    })
}
