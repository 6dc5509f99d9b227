//! Unifies API for accessing user accounts.
use std::fmt::Debug;

use log::info;

use crate::{
    db_types::{NewUser, UserAccount},
    traits::{AccountApiError, AccountManagement},
};

pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates a new user. Fails with [`AccountApiError::UserAlreadyExists`] if the login is taken.
    pub async fn create_user(&self, user: NewUser) -> Result<UserAccount, AccountApiError> {
        let account = self.db.create_user(user).await?;
        info!("🧑️ New user '{}' created with id #{}", account.login, account.id);
        Ok(account)
    }

    /// Fetches the user account for the given id. If no account exists, `None` is returned.
    pub async fn account_by_id(&self, user_id: i64) -> Result<Option<UserAccount>, AccountApiError> {
        self.db.fetch_user_account(user_id).await
    }

    pub async fn account_by_login(&self, login: &str) -> Result<Option<UserAccount>, AccountApiError> {
        self.db.fetch_user_by_login(login).await
    }
}
