//! Loyalty Engine
//!
//! The loyalty engine tracks loyalty-point accrual for user orders. Users register order numbers, an external accrual
//! system later reports whether (and how much) each order earned, and users can spend what has been definitively
//! accrued.
//!
//! The library is divided into three main sections:
//! 1. Storage contracts ([`traits`]) and their SQLite implementation ([`SqliteDatabase`]). The data types used in the
//!    store are defined in [`db_types`] and are public.
//! 2. The public API ([`OrderRegistryApi`], [`LedgerApi`], [`AccountApi`]). Each API wraps a backend implementing the
//!    traits it needs.
//! 3. The [`ReconciliationLoop`], a background task that resolves pending orders by polling an [`AccrualOracle`].
//!    The oracle itself is an abstraction; the HTTP client lives in a separate crate.
pub mod db_types;
pub mod helpers;
mod loyalty_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use loyalty_api::{
    accounts_api::AccountApi,
    ledger_api::LedgerApi,
    ledger_objects,
    order_objects,
    order_registry_api::OrderRegistryApi,
    reconciliation::{self, CycleReport, ReconciliationConfig, ReconciliationLoop},
};
pub use traits::{
    AccountManagement,
    AccrualOracle,
    AccrualStatus,
    LedgerManagement,
    OracleOutcome,
    OrderManagement,
};
