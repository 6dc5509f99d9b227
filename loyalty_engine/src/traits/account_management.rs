use thiserror::Error;

use crate::db_types::{NewUser, UserAccount};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A user with login '{0}' already exists")]
    UserAlreadyExists(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// The `AccountManagement` trait defines behaviour for managing the user accounts that own orders and withdrawals.
///
/// Authentication is handled outside the engine. The engine only needs accounts to exist so that order ownership and
/// withdrawals can reference them.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Creates a new user account. Fails with [`AccountApiError::UserAlreadyExists`] if the login is taken.
    async fn create_user(&self, user: NewUser) -> Result<UserAccount, AccountApiError>;

    /// Fetches the user account associated with the given id. If no account exists, `None` is returned.
    async fn fetch_user_account(&self, user_id: i64) -> Result<Option<UserAccount>, AccountApiError>;

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<UserAccount>, AccountApiError>;
}
