use std::{future::Future, time::Duration};

use loyalty_common::Points;

use crate::db_types::{OrderNumber, OrderStatusType};

/// The order status as reported by the accrual system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualStatus {
    /// The accrual system has seen the order, but has not started on it.
    Registered,
    /// The reward is being calculated.
    Processing,
    /// The order does not qualify for a reward.
    Invalid,
    /// The reward calculation is complete.
    Processed,
    /// A status value this service does not understand.
    Unknown(String),
}

impl From<&str> for AccrualStatus {
    /// Status values are matched case-insensitively. This conversion cannot fail; unrecognised values are kept as
    /// [`AccrualStatus::Unknown`].
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "registered" => Self::Registered,
            "processing" => Self::Processing,
            "invalid" => Self::Invalid,
            "processed" => Self::Processed,
            _ => Self::Unknown(value.to_string()),
        }
    }
}

impl AccrualStatus {
    /// Maps the external status onto the local order status. `None` means the status is not understood, and the
    /// order should be left alone.
    pub fn local_status(&self) -> Option<OrderStatusType> {
        match self {
            Self::Registered | Self::Processing => Some(OrderStatusType::InProgress),
            Self::Invalid => Some(OrderStatusType::Rejected),
            Self::Processed => Some(OrderStatusType::Scored),
            Self::Unknown(_) => None,
        }
    }
}

/// The typed result of asking the accrual system about one order.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleOutcome {
    /// The accrual system has a record of the order.
    Scored { status: AccrualStatus, accrual: Option<Points> },
    /// The accrual system asked us to back off. No request should be sent before `retry_after` has passed.
    RateLimited { retry_after: Duration },
    /// The accrual system has no record of the order yet. This is not an error.
    NotYetKnown,
    /// The query failed, even after the client's own retries.
    TransientFailure(String),
}

/// The network boundary to the external accrual system.
///
/// Queries are pure reads and may be repeated freely. Implementations retry transient network failures internally
/// (a small, bounded number of times), but must report rate limiting immediately as [`OracleOutcome::RateLimited`]
/// so that the caller can pause its whole batch.
pub trait AccrualOracle: Send + Sync {
    fn query(&self, number: &OrderNumber) -> impl Future<Output = OracleOutcome> + Send;
}
