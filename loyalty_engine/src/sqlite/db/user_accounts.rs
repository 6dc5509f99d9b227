use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, UserAccount},
    traits::AccountApiError,
};

pub async fn create_user(user: NewUser, conn: &mut SqliteConnection) -> Result<UserAccount, AccountApiError> {
    let login = user.login.clone();
    let account: UserAccount = sqlx::query_as(
        r#"
            INSERT INTO users (login, password_hash) VALUES ($1, $2)
            RETURNING id, login, created_at;
        "#,
    )
    .bind(user.login)
    .bind(user.password_hash)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(de) if de.is_unique_violation() => AccountApiError::UserAlreadyExists(login),
        e => AccountApiError::from(e),
    })?;
    debug!("🧑️ Created user '{}' with id #{}", account.login, account.id);
    Ok(account)
}

pub async fn user_account_by_id(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, AccountApiError> {
    let account = sqlx::query_as("SELECT id, login, created_at FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(account)
}

pub async fn user_account_by_login(
    login: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, AccountApiError> {
    let account = sqlx::query_as("SELECT id, login, created_at FROM users WHERE login = $1")
        .bind(login)
        .fetch_optional(conn)
        .await?;
    Ok(account)
}
