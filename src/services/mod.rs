//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! Each operation runs inside one unit of work and commits or rolls back
//! as a whole.

pub mod account_service;
pub mod category_service;
pub mod goal_service;
pub mod summary_service;
pub mod transaction_service;
