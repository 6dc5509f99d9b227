use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Order, OrderAccrualUpdate, OrderNumber, OrderStatusType},
    traits::{InsertOrderResult, OrderRegistryError},
};

const ORDER_COLUMNS: &str = "id, number, user_id, status, accrual, uploaded_at";

/// Inserts a new order for `user_id`, or returns the existing record if the number is already taken.
///
/// The returned order always reflects the row as stored, so callers can compare its `user_id` to detect ownership
/// conflicts. This is not atomic on its own; run it inside a transaction and pass `&mut *tx` as the connection.
pub async fn idempotent_insert(
    user_id: i64,
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, OrderRegistryError> {
    let rows = sqlx::query("INSERT INTO orders (number, user_id, status) VALUES ($1, $2, $3) ON CONFLICT (number) DO NOTHING")
        .bind(number.as_str())
        .bind(user_id)
        .bind(OrderStatusType::Pending)
        .execute(&mut *conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(de) if de.is_foreign_key_violation() => OrderRegistryError::UserNotFound(user_id),
            e => OrderRegistryError::from(e),
        })?
        .rows_affected();
    let order = fetch_order_by_number(number, conn).await?.ok_or_else(|| OrderRegistryError::OrderNotFound(number.clone()))?;
    if rows == 1 {
        debug!("📝️ Order {number} registered for user #{user_id} with id {}", order.id);
        Ok(InsertOrderResult::Inserted(order))
    } else {
        trace!("📝️ Order {number} already exists (owner #{})", order.user_id);
        Ok(InsertOrderResult::AlreadyExists(order))
    }
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE number = $1");
    let order = sqlx::query_as(&sql).bind(number.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// All orders belonging to `user_id`, newest first.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY uploaded_at DESC, id DESC");
    let orders = sqlx::query_as(&sql).bind(user_id).fetch_all(conn).await?;
    Ok(orders)
}

/// Up to `limit` orders that are still `Pending` or `InProgress`, oldest first.
pub async fn fetch_unresolved_orders(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let [pending, in_progress] = OrderStatusType::unresolved();
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE status IN ($1, $2) ORDER BY uploaded_at ASC, id ASC LIMIT $3"
    );
    let orders = sqlx::query_as(&sql).bind(pending).bind(in_progress).bind(limit).fetch_all(conn).await?;
    trace!("📝️ Fetched {} unresolved orders", orders.len());
    Ok(orders)
}

/// Applies an accrual update to a non-terminal order in a single statement.
///
/// Returns `None` if the order does not exist or has already reached a terminal status, in which case nothing is
/// written. The accrual is only overwritten when the update carries one.
pub async fn update_order_accrual(
    number: &OrderNumber,
    update: OrderAccrualUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let [pending, in_progress] = OrderStatusType::unresolved();
    let sql = format!(
        r#"
        UPDATE orders SET status = $1, accrual = COALESCE($2, accrual)
        WHERE number = $3 AND status IN ($4, $5)
        RETURNING {ORDER_COLUMNS}"#
    );
    let order: Option<Order> = sqlx::query_as(&sql)
        .bind(update.status)
        .bind(update.accrual)
        .bind(number.as_str())
        .bind(pending)
        .bind(in_progress)
        .fetch_optional(conn)
        .await?;
    if let Some(order) = &order {
        debug!("📝️ Order {number} is now {} (accrual: {:?})", order.status, order.accrual);
    }
    Ok(order)
}
