use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
pub use loyalty_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::is_valid_luhn;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------     OrderNumber       ---------------------------------------------------------
/// A checksummed order number.
///
/// The only way to construct an `OrderNumber` from user input is via [`FromStr`], which rejects anything that is not
/// a non-empty string of ASCII digits passing the Luhn check. Values read back from the database are trusted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize)]
#[sqlx(transparent)]
pub struct OrderNumber(String);

impl FromStr for OrderNumber {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if is_valid_luhn(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ConversionError(format!("'{s}' is not a valid order number")))
        }
    }
}

impl<'de> Deserialize<'de> for OrderNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: serde::Deserializer<'de> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The accrual status of an order.
///
/// ```text
/// Pending ──► InProgress ──► Scored   (terminal)
///    │             └───────► Rejected (terminal)
///    └──────► Scored | Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been registered, but the accrual system has not reported on it yet.
    Pending,
    /// The accrual system knows about the order and is still calculating the reward.
    InProgress,
    /// The accrual system has finished, and the reward (if any) has been credited.
    Scored,
    /// The accrual system has declared the order ineligible for a reward.
    Rejected,
}

impl OrderStatusType {
    /// Terminal orders are never touched by reconciliation again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Scored | Self::Rejected)
    }

    /// Statuses that the reconciliation loop still has to resolve.
    pub fn unresolved() -> [Self; 2] {
        [Self::Pending, Self::InProgress]
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::InProgress => write!(f, "InProgress"),
            OrderStatusType::Scored => write!(f, "Scored"),
            OrderStatusType::Rejected => write!(f, "Rejected"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "InProgress" => Ok(Self::InProgress),
            "Scored" => Ok(Self::Scored),
            "Rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub number: OrderNumber,
    pub user_id: i64,
    pub status: OrderStatusType,
    /// The reward reported by the accrual system. Only ever set when the order is `Scored`.
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
}

//--------------------------------------   OrderAccrualUpdate  ---------------------------------------------------------
/// The fields of an order that the reconciliation process is allowed to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAccrualUpdate {
    pub status: OrderStatusType,
    pub accrual: Option<Points>,
}

impl OrderAccrualUpdate {
    pub fn new(status: OrderStatusType) -> Self {
        Self { status, accrual: None }
    }

    pub fn with_accrual(mut self, accrual: Points) -> Self {
        self.accrual = Some(accrual);
        self
    }

    /// Returns true if applying this update to `order` would not change anything.
    pub fn is_noop_for(&self, order: &Order) -> bool {
        self.status == order.status && (self.accrual.is_none() || self.accrual == order.accrual)
    }
}

//--------------------------------------     UserAccount       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub login: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       NewUser         ---------------------------------------------------------
/// A new user account. Credential hashing is the caller's concern, the hash is stored as an opaque byte string.
#[derive(Clone)]
pub struct NewUser {
    pub login: String,
    pub password_hash: Vec<u8>,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NewUser {{ login: {}, password_hash: **** }}", self.login)
    }
}

impl NewUser {
    pub fn new<S: Into<String>>(login: S, password_hash: Vec<u8>) -> Self {
        Self { login: login.into(), password_hash }
    }
}

//--------------------------------------      Withdrawal       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    /// The order the points were spent on. Unique across all withdrawals.
    pub order_reference: OrderNumber,
    pub amount: Points,
    pub processed_at: DateTime<Utc>,
}

//--------------------------------------    NewWithdrawal      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWithdrawal {
    pub user_id: i64,
    pub order_reference: OrderNumber,
    pub amount: Points,
}

impl NewWithdrawal {
    pub fn new(user_id: i64, order_reference: OrderNumber, amount: Points) -> Self {
        Self { user_id, order_reference, amount }
    }
}

//--------------------------------------       Balance         ---------------------------------------------------------
/// The derived ledger view for a user. Never stored; always computed from orders and withdrawals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Sum of accruals on `Scored` orders, less everything withdrawn.
    pub current: Points,
    /// Sum of all withdrawals.
    pub withdrawn: Points,
}

impl Balance {
    /// Builds a balance snapshot from the raw totals.
    ///
    /// The withdrawal protocol guarantees `accrued >= withdrawn`. If that ever fails to hold, the inconsistency is
    /// logged and `current` is reported as zero rather than as a negative number.
    pub fn from_totals(user_id: i64, accrued: Points, withdrawn: Points) -> Self {
        let mut current = accrued - withdrawn;
        if current.is_negative() {
            error!(
                "💰️ Ledger inconsistency for user #{user_id}: accrued {accrued} but withdrawn {withdrawn}. Reporting \
                 a zero balance."
            );
            current = Points::default();
        }
        Self { current, withdrawn }
    }
}
