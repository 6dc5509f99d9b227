//! Server configuration, read once at startup from `LOYALTY_*` environment variables.
use std::{env, time::Duration};

use accrual_tools::AccrualConfig;
use log::*;
use loyalty_common::helpers::{checked_numeric_setting, env_numeric_setting};
use loyalty_engine::{
    reconciliation::{DEFAULT_BATCH_SIZE, DEFAULT_POLL_INTERVAL},
    ReconciliationConfig,
};

use crate::errors::ServerError;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/loyalty_store.db";
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub max_db_connections: u32,
    /// Where and how to reach the external accrual system.
    pub accrual: AccrualConfig,
    /// Polling interval and batch size of the accrual worker.
    pub reconciliation: ReconciliationConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ServerError> {
        let database_url = env::var("LOYALTY_DATABASE_URL").ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
            info!("🪛️ LOYALTY_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_db_connections =
            env_numeric_setting("LOYALTY_MAX_DB_CONNECTIONS", DEFAULT_MAX_DB_CONNECTIONS, |v| *v > 0);
        let accrual = AccrualConfig::new_from_env().map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
        info!("🪛️ Accrual system: {}", accrual.base_url);
        let reconciliation = reconciliation_config(
            env::var("LOYALTY_POLL_INTERVAL_MS").ok(),
            env::var("LOYALTY_POLL_BATCH_SIZE").ok(),
        );
        Ok(Self { database_url, max_db_connections, accrual, reconciliation })
    }
}

/// Builds the worker configuration from raw setting values. Missing, unparseable or zero values fall back to the
/// defaults.
pub fn reconciliation_config(interval_ms: Option<String>, batch_size: Option<String>) -> ReconciliationConfig {
    let default_ms = u64::try_from(DEFAULT_POLL_INTERVAL.as_millis()).unwrap_or(1000);
    let interval_ms = checked_numeric_setting("LOYALTY_POLL_INTERVAL_MS", interval_ms, default_ms, |v| *v > 0);
    let batch_size = checked_numeric_setting("LOYALTY_POLL_BATCH_SIZE", batch_size, DEFAULT_BATCH_SIZE, |v| *v > 0);
    ReconciliationConfig { interval: Duration::from_millis(interval_ms), batch_size }
}
