use accrual_tools::AccrualApi;
use log::*;
use loyalty_engine::SqliteDatabase;
use tokio_util::sync::CancellationToken;

use crate::{config::ServerConfig, errors::ServerError, integrations::accrual::HttpAccrualOracle, service::LoyaltyService};

/// Opens the store, starts the accrual worker and runs until the process receives ctrl-c.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::open_and_migrate(&config.database_url, config.max_db_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let api = AccrualApi::new(config.accrual.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let oracle = HttpAccrualOracle::new(api);
    let service = LoyaltyService::new(db);
    let shutdown = CancellationToken::new();
    let worker = service.start_reconciliation(oracle, config.reconciliation, shutdown.clone());
    info!("🚀️ Loyalty service running. Press ctrl-c to stop.");

    let signal = tokio::signal::ctrl_c().await;
    info!("🚀️ Shutting down");
    shutdown.cancel();
    if let Err(e) = worker.await {
        error!("🚀️ The accrual worker did not shut down cleanly. {e}");
    }
    service.db().close().await;
    signal.map_err(ServerError::from)
}
