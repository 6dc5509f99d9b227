use std::{env, time::Duration};

use log::*;
use loyalty_common::helpers::env_numeric_setting;

use crate::AccrualApiError;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_WAIT_MIN_MS: u64 = 1000;
const DEFAULT_RETRY_WAIT_MAX_MS: u64 = 2000;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct AccrualConfig {
    /// Scheme, host and port of the accrual system, without a trailing slash.
    pub base_url: String,
    /// Retries after the first attempt for connection failures and server errors.
    pub max_retries: u32,
    /// The wait before the first retry. Each further retry doubles it, up to `retry_wait_max`.
    pub retry_wait_min: Duration,
    pub retry_wait_max: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_wait_min: Duration::from_millis(DEFAULT_RETRY_WAIT_MIN_MS),
            retry_wait_max: Duration::from_millis(DEFAULT_RETRY_WAIT_MAX_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AccrualConfig {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: normalize_base_url(base_url), ..Default::default() }
    }

    pub fn with_retries(mut self, max_retries: u32, wait_min: Duration, wait_max: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_wait_min = wait_min;
        self.retry_wait_max = wait_max.max(wait_min);
        self
    }

    /// Reads the configuration from `LOYALTY_ACCRUAL_*` environment variables.
    ///
    /// The system address is mandatory. Invalid numeric values are logged and replaced by their defaults.
    pub fn new_from_env() -> Result<Self, AccrualApiError> {
        let address = env::var("LOYALTY_ACCRUAL_SYSTEM_ADDRESS")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AccrualApiError::Initialization("LOYALTY_ACCRUAL_SYSTEM_ADDRESS is not set".to_string()))?;
        let max_retries = env_numeric_setting("LOYALTY_ACCRUAL_MAX_RETRIES", DEFAULT_MAX_RETRIES, |_| true);
        let wait_min = env_numeric_setting("LOYALTY_ACCRUAL_RETRY_WAIT_MIN_MS", DEFAULT_RETRY_WAIT_MIN_MS, |_| true);
        let mut wait_max =
            env_numeric_setting("LOYALTY_ACCRUAL_RETRY_WAIT_MAX_MS", DEFAULT_RETRY_WAIT_MAX_MS, |_| true);
        if wait_max < wait_min {
            warn!("🪛️ LOYALTY_ACCRUAL_RETRY_WAIT_MAX_MS ({wait_max}) is below the minimum wait. Using {wait_min}");
            wait_max = wait_min;
        }
        let timeout = env_numeric_setting("LOYALTY_ACCRUAL_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS, |v| *v > 0);
        let config = Self::new(&address)
            .with_retries(max_retries, Duration::from_millis(wait_min), Duration::from_millis(wait_max));
        Ok(Self { timeout: Duration::from_secs(timeout), ..config })
    }
}

/// Trims the address and prepends `http://` when no scheme is given.
pub fn normalize_base_url(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}
