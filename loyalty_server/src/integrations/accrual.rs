//! Adapts the HTTP accrual client to the engine's [`AccrualOracle`] contract.
use std::future::Future;

use accrual_tools::{AccrualApi, AccrualApiError, AccrualResponse};
use log::*;
use loyalty_engine::{
    db_types::{OrderNumber, Points},
    AccrualOracle,
    AccrualStatus,
    OracleOutcome,
};

#[derive(Debug, Clone)]
pub struct HttpAccrualOracle {
    api: AccrualApi,
}

impl HttpAccrualOracle {
    pub fn new(api: AccrualApi) -> Self {
        Self { api }
    }
}

impl AccrualOracle for HttpAccrualOracle {
    fn query(&self, number: &OrderNumber) -> impl Future<Output = OracleOutcome> + Send {
        let api = self.api.clone();
        let number = number.as_str().to_string();
        async move {
            let result = api.fetch_order_accrual(&number).await;
            outcome_from_response(&number, result)
        }
    }
}

/// Folds the client's result into the typed outcome the reconciliation loop works with.
pub fn outcome_from_response(number: &str, result: Result<AccrualResponse, AccrualApiError>) -> OracleOutcome {
    match result {
        Ok(response) => {
            if response.order != number {
                warn!("🧮️ Asked the accrual system about {number}, but got an answer for {}", response.order);
                return OracleOutcome::TransientFailure(format!("Mismatched order number {}", response.order));
            }
            let status = AccrualStatus::from(response.status.as_str());
            match response.accrual.map(Points::from_decimal).transpose() {
                Ok(Some(accrual)) if accrual.is_negative() => {
                    OracleOutcome::TransientFailure(format!("Negative accrual {accrual} for order {number}"))
                },
                Ok(accrual) => OracleOutcome::Scored { status, accrual },
                Err(e) => OracleOutcome::TransientFailure(format!("Invalid accrual for order {number}. {e}")),
            }
        },
        Err(AccrualApiError::NotRegistered(_)) => OracleOutcome::NotYetKnown,
        Err(AccrualApiError::RateLimited { retry_after }) => OracleOutcome::RateLimited { retry_after },
        Err(e) => OracleOutcome::TransientFailure(e.to_string()),
    }
}
