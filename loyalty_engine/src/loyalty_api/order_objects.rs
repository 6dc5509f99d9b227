use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType};

/// The outcome of a successful order registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterOrderResult {
    /// True if the same user had already registered this number. Nothing was written in that case.
    pub already_exists: bool,
    pub order: Order,
}

/// The boundary representation of an order, with the accrual as a decimal amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub number: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<f64>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            number: order.number.as_str().to_string(),
            status: status_label(order.status).to_string(),
            accrual: order.accrual.map(|a| a.to_decimal()),
            uploaded_at: order.uploaded_at,
        }
    }
}

/// The status labels that clients of the loyalty service see.
pub fn status_label(status: OrderStatusType) -> &'static str {
    match status {
        OrderStatusType::Pending => "NEW",
        OrderStatusType::InProgress => "PROCESSING",
        OrderStatusType::Scored => "PROCESSED",
        OrderStatusType::Rejected => "INVALID",
    }
}
