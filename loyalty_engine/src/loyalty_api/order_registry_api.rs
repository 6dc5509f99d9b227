//! Registration of order numbers and per-user order listings.
use std::fmt::Debug;

use log::{debug, info, warn};

use crate::{
    db_types::{Order, OrderNumber},
    loyalty_api::order_objects::RegisterOrderResult,
    traits::{InsertOrderResult, OrderManagement, OrderRegistryError},
};

/// `OrderRegistryApi` records which user owns which order number.
///
/// Registration is idempotent for the owner and rejects every other user. The insert-or-detect-owner step is a single
/// atomic unit in the backend, so two concurrent registrations of an unseen number can never both succeed.
pub struct OrderRegistryApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderRegistryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderRegistryApi ({:?})", self.db)
    }
}

impl<B> OrderRegistryApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Registers `number` for `user_id`.
    ///
    /// New numbers are stored with status `Pending`. Re-registering a number you already own succeeds with
    /// `already_exists` set. A number owned by somebody else fails with [`OrderRegistryError::OwnedByAnotherUser`] and
    /// leaves the existing record untouched.
    pub async fn register_order(
        &self,
        user_id: i64,
        number: &OrderNumber,
    ) -> Result<RegisterOrderResult, OrderRegistryError> {
        match self.db.insert_order(user_id, number).await? {
            InsertOrderResult::Inserted(order) => {
                info!("📦️ Order {number} registered for user #{user_id}");
                Ok(RegisterOrderResult { already_exists: false, order })
            },
            InsertOrderResult::AlreadyExists(order) if order.user_id == user_id => {
                debug!("📦️ Order {number} was already registered by user #{user_id}");
                Ok(RegisterOrderResult { already_exists: true, order })
            },
            InsertOrderResult::AlreadyExists(order) => {
                warn!("📦️ User #{user_id} tried to register order {number}, which belongs to user #{}", order.user_id);
                Err(OrderRegistryError::OwnedByAnotherUser(number.clone()))
            },
        }
    }

    /// All the user's orders, newest first, with their current status and accrual.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderRegistryError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    pub async fn order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderRegistryError> {
        self.db.fetch_order_by_number(number).await
    }
}
