//! Personal finance tracker API.
//!
//! Users keep accounts, categorise income and expenses as transactions, and
//! set spending or saving goals. Every transaction attached to an account
//! moves that account's balance in the same atomic operation that records
//! it, so balances always equal the initial balance plus the signed sum of
//! the account's transactions.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
