use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Balance, Withdrawal};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceView {
    pub current: f64,
    pub withdrawn: f64,
}

impl From<Balance> for BalanceView {
    fn from(balance: Balance) -> Self {
        Self { current: balance.current.to_decimal(), withdrawn: balance.withdrawn.to_decimal() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalView {
    pub order: String,
    pub sum: f64,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalView {
    fn from(w: Withdrawal) -> Self {
        Self { order: w.order_reference.as_str().to_string(), sum: w.amount.to_decimal(), processed_at: w.processed_at }
    }
}
