use log::{debug, trace};
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{NewWithdrawal, OrderStatusType, Points, Withdrawal},
    traits::{LedgerError, WithdrawalResult},
};

#[derive(Debug, Clone, Copy, FromRow)]
pub struct LedgerTotals {
    pub accrued: Points,
    pub withdrawn: Points,
}

/// Sums the accruals on the user's `Scored` orders and everything the user has withdrawn.
pub async fn ledger_totals(user_id: i64, conn: &mut SqliteConnection) -> Result<LedgerTotals, sqlx::Error> {
    let totals = sqlx::query_as(
        r#"
        SELECT
            (SELECT COALESCE(SUM(accrual), 0) FROM orders WHERE user_id = $1 AND status = $2) AS accrued,
            (SELECT COALESCE(SUM(amount), 0) FROM withdrawals WHERE user_id = $1) AS withdrawn
        "#,
    )
    .bind(user_id)
    .bind(OrderStatusType::Scored)
    .fetch_one(conn)
    .await?;
    Ok(totals)
}

/// Records a withdrawal if, and only if, the user's available balance covers it.
///
/// The balance check and the insert are a single statement, so two writers can never both pass the check against
/// the same funds.
pub async fn insert_if_funded(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<WithdrawalResult, LedgerError> {
    let NewWithdrawal { user_id, order_reference, amount } = withdrawal;
    let result: Option<Withdrawal> = sqlx::query_as(
        r#"
        INSERT INTO withdrawals (user_id, order_reference, amount)
        SELECT $1, $2, $3
        WHERE
            (SELECT COALESCE(SUM(accrual), 0) FROM orders WHERE user_id = $1 AND status = $4)
            - (SELECT COALESCE(SUM(amount), 0) FROM withdrawals WHERE user_id = $1)
            >= $3
        RETURNING id, user_id, order_reference, amount, processed_at
        "#,
    )
    .bind(user_id)
    .bind(order_reference.as_str())
    .bind(amount)
    .bind(OrderStatusType::Scored)
    .fetch_optional(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(de) if de.is_unique_violation() => {
            LedgerError::WithdrawalAlreadyExists(order_reference.clone())
        },
        sqlx::Error::Database(de) if de.is_foreign_key_violation() => LedgerError::UserNotFound(user_id),
        e => LedgerError::from(e),
    })?;
    match result {
        Some(w) => {
            debug!("💸️ User #{user_id} withdrew {amount} against order {order_reference}");
            Ok(WithdrawalResult::Processed(w))
        },
        None => {
            trace!("💸️ User #{user_id} has insufficient funds to withdraw {amount}");
            Ok(WithdrawalResult::InsufficientFunds)
        },
    }
}

/// All withdrawals made by `user_id`, newest first.
pub async fn fetch_withdrawals_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals = sqlx::query_as(
        r#"
        SELECT id, user_id, order_reference, amount, processed_at
        FROM withdrawals WHERE user_id = $1 ORDER BY processed_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(withdrawals)
}
