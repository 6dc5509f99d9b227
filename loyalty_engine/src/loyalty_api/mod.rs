//! # Loyalty engine public API
//!
//! The `loyalty_api` module exposes the programmatic API of the loyalty engine. Every API is a thin struct that wraps a
//! storage backend implementing the traits it needs, so callers can pick the pieces they want.
//!
//! * [`order_registry_api`] registers order numbers against their owners and lists a user's orders.
//! * [`ledger_api`] derives balances and runs the overdraft-safe withdrawal protocol.
//! * [`accounts_api`] manages the minimal user records that orders and withdrawals belong to.
//! * [`reconciliation`] is the background loop that resolves pending orders against the accrual oracle.
//!
//! # API usage
//!
//! ```rust,ignore
//! use loyalty_engine::{LedgerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements LedgerManagement
//! let api = LedgerApi::new(db);
//! let balance = api.balance(user_id).await?;
//! ```
pub mod accounts_api;
pub mod ledger_api;
pub mod ledger_objects;
pub mod order_objects;
pub mod order_registry_api;
pub mod reconciliation;
