//! Balances and the withdrawal protocol.
use std::fmt::Debug;

use log::{debug, info};
use loyalty_common::Points;

use crate::{
    db_types::{Balance, NewWithdrawal, OrderNumber, Withdrawal},
    helpers::AccountLocks,
    traits::{LedgerError, LedgerManagement, WithdrawalResult},
};

/// `LedgerApi` derives user balances and owns the creation of withdrawals.
///
/// Withdrawals for the same user are serialised through a per-user lock, and the backend performs the balance check
/// and the insert as one atomic unit. Withdrawals for different users never contend for the lock.
pub struct LedgerApi<B> {
    db: B,
    locks: AccountLocks,
}

impl<B: Debug> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi ({:?})", self.db)
    }
}

impl<B> LedgerApi<B>
where B: LedgerManagement
{
    pub fn new(db: B) -> Self {
        Self { db, locks: AccountLocks::new() }
    }

    /// The user's current (spendable) balance and the total withdrawn so far.
    pub async fn balance(&self, user_id: i64) -> Result<Balance, LedgerError> {
        self.db.fetch_balance(user_id).await
    }

    /// Spends `amount` of the user's points against the order `reference`.
    ///
    /// Non-positive amounts are rejected with [`LedgerError::InvalidAmount`] before the store is touched. If the
    /// current balance does not cover the amount, nothing is written and [`LedgerError::InsufficientFunds`] is
    /// returned.
    pub async fn withdraw(
        &self,
        user_id: i64,
        reference: OrderNumber,
        amount: Points,
    ) -> Result<Withdrawal, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let guard = self.locks.lock(user_id).await;
        debug!("💰️ Acquired withdrawal lock for user #{}", guard.account_id());
        let result = self.db.insert_withdrawal(NewWithdrawal::new(user_id, reference, amount)).await?;
        drop(guard);
        match result {
            WithdrawalResult::Processed(withdrawal) => {
                info!("💰️ User #{user_id} withdrew {amount} against order {}", withdrawal.order_reference);
                Ok(withdrawal)
            },
            WithdrawalResult::InsufficientFunds => {
                debug!("💰️ Withdrawal of {amount} for user #{user_id} rejected. Insufficient funds");
                Err(LedgerError::InsufficientFunds(amount))
            },
        }
    }

    /// All the user's withdrawals, newest first.
    pub async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        self.db.fetch_withdrawals_for_user(user_id).await
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use mockall::{mock, predicate::eq};

    use super::*;

    mock! {
        pub Ledger {}
        impl LedgerManagement for Ledger {
            async fn fetch_balance(&self, user_id: i64) -> Result<Balance, LedgerError>;
            async fn insert_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<WithdrawalResult, LedgerError>;
            async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError>;
        }
    }

    fn reference() -> OrderNumber {
        "79927398713".parse().unwrap()
    }

    #[tokio::test]
    async fn non_positive_amounts_never_reach_the_store() {
        let mut db = MockLedger::new();
        db.expect_insert_withdrawal().never();
        db.expect_fetch_balance().never();
        let api = LedgerApi::new(db);
        for amount in [Points::from(0), Points::from(-100)] {
            let err = api.withdraw(1, reference(), amount).await.unwrap_err();
            assert!(matches!(err, LedgerError::InvalidAmount(a) if a == amount));
        }
    }

    #[tokio::test]
    async fn insufficient_funds_is_reported_with_the_requested_amount() {
        let mut db = MockLedger::new();
        db.expect_insert_withdrawal()
            .with(eq(NewWithdrawal::new(1, reference(), Points::from(1))))
            .times(1)
            .returning(|_| Ok(WithdrawalResult::InsufficientFunds));
        let api = LedgerApi::new(db);
        let err = api.withdraw(1, reference(), Points::from(1)).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds(a) if a == Points::from(1)));
    }

    #[tokio::test]
    async fn processed_withdrawals_are_returned() {
        let mut db = MockLedger::new();
        db.expect_insert_withdrawal().times(1).returning(|w| {
            Ok(WithdrawalResult::Processed(Withdrawal {
                id: 7,
                user_id: w.user_id,
                order_reference: w.order_reference,
                amount: w.amount,
                processed_at: Utc::now(),
            }))
        });
        let api = LedgerApi::new(db);
        let withdrawal = api.withdraw(3, reference(), Points::from(250)).await.unwrap();
        assert_eq!(withdrawal.id, 7);
        assert_eq!(withdrawal.user_id, 3);
        assert_eq!(withdrawal.amount, Points::from(250));
    }

    #[tokio::test]
    async fn store_failures_are_passed_through() {
        let mut db = MockLedger::new();
        db.expect_fetch_balance()
            .with(eq(5))
            .times(1)
            .returning(|_| Err(LedgerError::DatabaseError("disk full".into())));
        let api = LedgerApi::new(db);
        assert!(matches!(api.balance(5).await, Err(LedgerError::DatabaseError(_))));
    }
}
