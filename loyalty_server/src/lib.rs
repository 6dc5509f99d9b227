//! # Loyalty server
//! This crate hosts the process around the loyalty engine. It is responsible for:
//! * Reading the configuration from the environment.
//! * Opening (and migrating) the ledger database.
//! * Running the accrual worker, which reconciles pending orders against the external accrual system.
//! * Stopping everything cleanly on Ctrl-C.
//!
//! The [`service::LoyaltyService`] bundles the operations that a request-handling layer calls into.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
pub mod accrual_worker;
pub mod cli;
pub mod config;
pub mod errors;
pub mod integrations;
pub mod server;
pub mod service;
