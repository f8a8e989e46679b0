//! Data models representing stored entities and their API shapes.

/// Bank, cash and credit accounts
pub mod account;
/// User-defined categories
pub mod category;
/// Financial goals
pub mod goal;
/// Page requests and paginated results
pub mod pagination;
/// Income/expense summary
pub mod summary;
/// Income and expense transactions
pub mod transaction;
/// API-key authenticated users
pub mod user;
