use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER},
    Client,
    Response,
    StatusCode,
};

use crate::{config::AccrualConfig, AccrualApiError, AccrualResponse};

#[derive(Clone)]
pub struct AccrualApi {
    config: AccrualConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for AccrualApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccrualApi ({})", self.config.base_url)
    }
}

impl AccrualApi {
    pub fn new(config: AccrualConfig) -> Result<Self, AccrualApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AccrualApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Fetches the accrual record for order `number`.
    ///
    /// Connection failures and 5xx responses are retried up to `max_retries` times with a doubling wait. A `429` is
    /// returned immediately as [`AccrualApiError::RateLimited`], and a `204` as [`AccrualApiError::NotRegistered`].
    pub async fn fetch_order_accrual(&self, number: &str) -> Result<AccrualResponse, AccrualApiError> {
        let url = self.url(&format!("/api/orders/{number}"));
        let mut attempt = 0u32;
        loop {
            match self.get_order(number, &url).await {
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let wait = self.backoff(attempt);
                    attempt += 1;
                    debug!("🧮️ Accrual query for {number} failed ({e}). Retry {attempt} in {wait:?}");
                    tokio::time::sleep(wait).await;
                },
                Err(e) if e.is_retryable() => {
                    return Err(AccrualApiError::RetriesExhausted { attempts: attempt + 1, last_error: e.to_string() });
                },
                result => return result,
            }
        }
    }

    async fn get_order(&self, number: &str, url: &str) -> Result<AccrualResponse, AccrualApiError> {
        trace!("🧮️ Sending accrual query: {url}");
        let response =
            self.client.get(url).send().await.map_err(|e| AccrualApiError::RestResponseError(e.to_string()))?;
        match response.status() {
            StatusCode::OK => {
                let record = response.json::<AccrualResponse>().await.map_err(|e| AccrualApiError::JsonError(e.to_string()))?;
                trace!("🧮️ Accrual record for {number}: {record:?}");
                Ok(record)
            },
            StatusCode::NO_CONTENT => Err(AccrualApiError::NotRegistered(number.to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = retry_after(&response);
                warn!("🧮️ Accrual system is rate limiting us. Retry after {retry_after:?}");
                Err(AccrualApiError::RateLimited { retry_after })
            },
            status => {
                let message = response.text().await.map_err(|e| AccrualApiError::RestResponseError(e.to_string()))?;
                Err(AccrualApiError::QueryError { status: status.as_u16(), message })
            },
        }
    }

    /// `retry_wait_min * 2^attempt`, capped at `retry_wait_max`.
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.config.retry_wait_min.saturating_mul(factor).min(self.config.retry_wait_max)
    }
}

/// The `Retry-After` header in whole seconds. Missing or unparseable values mean "no wait".
fn retry_after(response: &Response) -> Duration {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_default()
}
