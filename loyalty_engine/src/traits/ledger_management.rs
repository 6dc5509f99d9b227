use loyalty_common::Points;
use thiserror::Error;

use crate::{
    db_types::{Balance, NewWithdrawal, OrderNumber, Withdrawal},
    traits::{data_objects::WithdrawalResult, AccountApiError},
};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Withdrawal amounts must be positive. Got {0}")]
    InvalidAmount(Points),
    #[error("Insufficient funds to withdraw {0}")]
    InsufficientFunds(Points),
    #[error("The requested user id {0} does not exist")]
    UserNotFound(i64),
    #[error("A withdrawal against order {0} has already been made")]
    WithdrawalAlreadyExists(OrderNumber),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

impl From<AccountApiError> for LedgerError {
    fn from(e: AccountApiError) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// The `LedgerManagement` trait defines the storage behaviour behind user balances and withdrawals.
///
/// Balances are never stored. They are derived from the accruals on `Scored` orders and the withdrawal history every
/// time they are needed.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    /// Computes the current balance and the total withdrawn for the user.
    async fn fetch_balance(&self, user_id: i64) -> Result<Balance, LedgerError>;

    /// Records the withdrawal, if and only if the user's unclamped balance covers the amount.
    ///
    /// The balance check and the insert must be one atomic unit: no other withdrawal for the same user may be
    /// recorded between the two. If the balance is too low, nothing is written and
    /// [`WithdrawalResult::InsufficientFunds`] is returned.
    async fn insert_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<WithdrawalResult, LedgerError>;

    /// Fetches all withdrawals for the user, most recent first.
    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError>;
}
