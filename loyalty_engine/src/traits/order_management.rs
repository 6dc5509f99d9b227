use thiserror::Error;

use crate::{
    db_types::{Order, OrderAccrualUpdate, OrderNumber},
    traits::{data_objects::InsertOrderResult, AccountApiError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderRegistryError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Order {0} has already been registered by another user")]
    OwnedByAnotherUser(OrderNumber),
    #[error("The requested user id {0} does not exist")]
    UserNotFound(i64),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNumber),
}

impl From<sqlx::Error> for OrderRegistryError {
    fn from(e: sqlx::Error) -> Self {
        OrderRegistryError::DatabaseError(e.to_string())
    }
}

impl From<AccountApiError> for OrderRegistryError {
    fn from(e: AccountApiError) -> Self {
        OrderRegistryError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait defines the storage behaviour for order registration and accrual tracking.
///
/// Backends own the atomicity guarantees described on each method. In particular, [`Self::insert_order`] must
/// perform the insert and the ownership check as a single atomic unit, so that two users racing to register the
/// same order number can never both succeed.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores the order for the given user with `Pending` status, unless the number is already registered.
    ///
    /// Returns the stored order in either case. If the order already existed, the returned record carries the
    /// original owner, which may differ from `user_id`. The existing record is never modified.
    async fn insert_order(&self, user_id: i64, number: &OrderNumber) -> Result<InsertOrderResult, OrderRegistryError>;

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderRegistryError>;

    /// Fetches all orders owned by the user, most recently uploaded first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderRegistryError>;

    /// Fetches up to `limit` orders that are not in a terminal status, oldest upload first.
    async fn fetch_unresolved_orders(&self, limit: i64) -> Result<Vec<Order>, OrderRegistryError>;

    /// Applies the accrual update to the order in a single atomic write.
    ///
    /// The update is only applied if the order is not yet in a terminal status. Returns the updated order, or `None`
    /// if the order does not exist or was already terminal.
    async fn update_order_accrual(
        &self,
        number: &OrderNumber,
        update: OrderAccrualUpdate,
    ) -> Result<Option<Order>, OrderRegistryError>;
}
