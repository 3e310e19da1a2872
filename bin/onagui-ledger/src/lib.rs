mod observability;

pub mod utility;

pub use onagui_primitives::error::LedgerError;

use crate::utility::db_pool::create_db_pool;
use crate::utility::logging::setup_logging;
use crate::utility::server::serve;
use crate::utility::tasks::{build_router, load_env, run_migrations};
use crate::utility::withdrawal_poller::spawn_withdrawal_poller;
use eyre::Report;
use onagui_core::app_state::AppState;
use onagui_core::store::PgLedgerStore;
use onagui_primitives::models::app_config::AppConfig;
use std::sync::Arc;
use tracing::info;

pub async fn run() -> Result<(), Report> {
    // 1. load environment variables
    load_env();

    // 2. initialize logging first (so we can log everything else)
    setup_logging();

    info!("Starting ONAGUI ledger service...");

    // 3. load configuration
    let config = AppConfig::from_env()?;

    // 4. create database connection pool
    let pool = create_db_pool()?;

    // 5. bring the schema up to date
    run_migrations(&pool)?;

    // 6. build application state around the Postgres store
    let store = Arc::new(PgLedgerStore::new(pool));
    let state = AppState::new(store, config)?;

    // 7. start the withdrawal poller
    spawn_withdrawal_poller(state.clone());

    // 8. initialize metrics
    let (metric_layer, metric_handle) = observability::metrics::setup_metrics();

    // 9. build axum router
    let app = build_router(state.clone(), metric_layer, metric_handle)?;

    // 10. start HTTP server
    serve(app).await?;

    info!("Ledger service shut down gracefully");
    Ok(())
}
