use crate::db_types::{Order, Withdrawal};

/// The outcome of an idempotent order insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    Inserted(Order),
    AlreadyExists(Order),
}

impl InsertOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            Self::Inserted(o) | Self::AlreadyExists(o) => o,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalResult {
    Processed(Withdrawal),
    InsufficientFunds,
}
