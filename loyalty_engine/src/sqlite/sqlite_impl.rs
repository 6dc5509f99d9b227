//! `SqliteDatabase` is the concrete SQLite backend for the loyalty engine.
//!
//! It implements all the storage traits defined in the [`crate::traits`] module.
//!
//! Every call, reads included, runs in its own transaction that is committed before returning. A pooled connection
//! never carries an open read snapshot into its next use, so a read always sees the latest committed writes.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{create_database_if_missing, new_pool, orders, user_accounts, withdrawals};
use crate::{
    db_types::{Balance, NewUser, NewWithdrawal, Order, OrderAccrualUpdate, OrderNumber, UserAccount, Withdrawal},
    traits::{
        AccountApiError,
        AccountManagement,
        InsertOrderResult,
        LedgerError,
        LedgerManagement,
        OrderManagement,
        OrderRegistryError,
        WithdrawalResult,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, user_id: i64, number: &OrderNumber) -> Result<InsertOrderResult, OrderRegistryError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::idempotent_insert(user_id, number, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderRegistryError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_number(number, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderRegistryError> {
        let mut tx = self.pool.begin().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(orders)
    }

    async fn fetch_unresolved_orders(&self, limit: i64) -> Result<Vec<Order>, OrderRegistryError> {
        let mut tx = self.pool.begin().await?;
        let orders = orders::fetch_unresolved_orders(limit, &mut tx).await?;
        tx.commit().await?;
        Ok(orders)
    }

    async fn update_order_accrual(
        &self,
        number: &OrderNumber,
        update: OrderAccrualUpdate,
    ) -> Result<Option<Order>, OrderRegistryError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_order_accrual(number, update, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn fetch_balance(&self, user_id: i64) -> Result<Balance, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let totals = withdrawals::ledger_totals(user_id, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Ledger totals for user #{user_id}: {totals:?}");
        Ok(Balance::from_totals(user_id, totals.accrued, totals.withdrawn))
    }

    async fn insert_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<WithdrawalResult, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let result = withdrawals::insert_if_funded(withdrawal, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let withdrawals = withdrawals::fetch_withdrawals_for_user(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(withdrawals)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<UserAccount, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let result = user_accounts::create_user(user, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_user_account(&self, user_id: i64) -> Result<Option<UserAccount>, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let result = user_accounts::user_account_by_id(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<UserAccount>, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let result = user_accounts::user_account_by_login(login, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Creates the database file if necessary, connects to it and brings the schema up to date.
    pub async fn open_and_migrate(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        create_database_if_missing(url).await?;
        let db = Self::new_with_url(url, max_connections).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
