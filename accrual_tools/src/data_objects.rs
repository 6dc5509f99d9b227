use serde::{Deserialize, Serialize};

/// The accrual system's record of a single order.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AccrualResponse {
    pub order: String,
    /// One of `REGISTERED`, `PROCESSING`, `INVALID` or `PROCESSED`. Kept verbatim; interpreting it is up to the caller.
    pub status: String,
    /// The reward in points, only present once the order is processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<f64>,
}
