//! # Backend contracts
//!
//! This module defines the interface contracts that storage backends and external collaborators need to fulfil in
//! order to be driven by the loyalty engine.
//!
//! * [`OrderManagement`] stores order numbers, their owners and their accrual state.
//! * [`LedgerManagement`] derives balances and records withdrawals.
//! * [`AccountManagement`] provides the minimal user account records that orders and withdrawals belong to.
//! * [`AccrualOracle`] is the network boundary to the external accrual system.
mod account_management;
mod accrual_oracle;
mod data_objects;
mod ledger_management;
mod order_management;

pub use account_management::{AccountApiError, AccountManagement};
pub use accrual_oracle::{AccrualOracle, AccrualStatus, OracleOutcome};
pub use data_objects::{InsertOrderResult, WithdrawalResult};
pub use ledger_management::{LedgerError, LedgerManagement};
pub use order_management::{OrderManagement, OrderRegistryError};
