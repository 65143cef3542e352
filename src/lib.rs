//! Loyalty points gateway.
//!
//! Users register, upload order numbers and withdraw accrued points; a pool
//! of background workers polls the external accrual service and reconciles
//! each order into the transactional ledger.
//!
//! # Modules
//!
//! - [`config`] - CLI flags and environment configuration
//! - [`secretary`] - credential sealing and bearer tokens
//! - [`ledger`] - transactional storage of users, balances, orders, withdrawals
//! - [`accrual`] - client for the external accrual service
//! - [`broker`] - the polling worker pool and its queues
//! - [`processor`] - request-side facade over the ledger
//! - [`gateway`] - HTTP routing and handlers
//! - [`recovery`] - startup re-enqueue of unfinished orders

pub mod accrual;
pub mod broker;
pub mod config;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod luhn;
pub mod processor;
pub mod recovery;
pub mod secretary;
