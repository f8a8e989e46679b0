//! Persistence behind a transactional unit-of-work interface.
//!
//! Services never talk to a database directly. They open a [`UnitOfWork`]
//! with [`Store::begin`], run every read and write of one logical operation
//! through it, and finish with [`UnitOfWork::commit`] or
//! [`UnitOfWork::rollback`]. Dropping a unit of work without committing
//! discards its writes.
//!
//! ## Implementations
//!
//! - [`PgStore`]: PostgreSQL. One unit of work is one database transaction;
//!   account and transaction rows are read `FOR UPDATE` so concurrent
//!   operations on the same account serialise on the row lock. Snapshot
//!   units run `REPEATABLE READ, READ ONLY`.
//! - [`MemoryStore`]: in-process state behind a mutex held for the whole unit
//!   of work. Used by tests and when no database is configured.
//!
//! ## Ownership
//!
//! Every lookup takes the owning user id. A record owned by someone else is
//! indistinguishable from a missing one: both come back as `None`.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        account::Account,
        category::Category,
        goal::{FinancialGoal, GoalFilter},
        pagination::PageRequest,
        transaction::{Transaction, TransactionFilter},
        user::User,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::{FailPoint, MemoryStore};
pub use postgres::PgStore;

/// Entry point to a storage backend.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a unit of work. All writes made through it become visible
    /// atomically on commit.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError>;

    /// Open a read-only unit of work in which every read sees the same
    /// point in time. Writes and the locking `find_account`/`find_transaction`
    /// fail through it on PostgreSQL.
    async fn begin_snapshot(&self) -> Result<Box<dyn UnitOfWork>, AppError>;

    /// Find an active user by the SHA-256 hex hash of their API key.
    async fn find_user_by_key_hash(&self, key_hash: &str) -> Result<Option<User>, AppError>;

    /// Create the user for `key_hash`, or refresh the display name and
    /// reactivate the existing one.
    async fn register_user(&self, display_name: &str, key_hash: &str) -> Result<User, AppError>;

    /// Cheap liveness probe used by the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}

/// One atomic scope of reads and writes.
///
/// `find_account` and `find_transaction` lock the returned row until the
/// unit of work ends.
#[async_trait]
pub trait UnitOfWork: Send {
    // Accounts
    async fn insert_account(&mut self, account: &Account) -> Result<(), AppError>;
    async fn find_account(&mut self, id: Uuid, user_id: Uuid)
    -> Result<Option<Account>, AppError>;
    /// Accounts newest first.
    async fn list_accounts(&mut self, user_id: Uuid) -> Result<Vec<Account>, AppError>;
    async fn save_account(&mut self, account: &Account) -> Result<(), AppError>;
    async fn delete_account(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
    /// Whether any transaction still posts to this account.
    async fn account_in_use(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    // Categories
    async fn insert_category(&mut self, category: &Category) -> Result<(), AppError>;
    async fn find_category(
        &mut self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Category>, AppError>;
    /// Categories ordered by name.
    async fn list_categories(&mut self, user_id: Uuid) -> Result<Vec<Category>, AppError>;
    async fn save_category(&mut self, category: &Category) -> Result<(), AppError>;
    async fn delete_category(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
    /// Whether any transaction or goal references this category.
    async fn category_in_use(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    // Transactions
    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), AppError>;
    async fn find_transaction(
        &mut self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Transaction>, AppError>;
    async fn save_transaction(&mut self, transaction: &Transaction) -> Result<(), AppError>;
    async fn delete_transaction(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
    /// Every transaction of the user, ordered by date.
    async fn list_transactions(&mut self, user_id: Uuid) -> Result<Vec<Transaction>, AppError>;
    /// One page of matching transactions ordered by date, plus the total match count.
    async fn query_transactions(
        &mut self,
        user_id: Uuid,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<Transaction>, u64), AppError>;

    // Goals
    async fn insert_goal(&mut self, goal: &FinancialGoal) -> Result<(), AppError>;
    async fn find_goal(
        &mut self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<FinancialGoal>, AppError>;
    async fn save_goal(&mut self, goal: &FinancialGoal) -> Result<(), AppError>;
    async fn delete_goal(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
    /// One page of matching goals ordered by start date, plus the total match count.
    async fn query_goals(
        &mut self,
        user_id: Uuid,
        filter: &GoalFilter,
        page: PageRequest,
    ) -> Result<(Vec<FinancialGoal>, u64), AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

/// Shared handle used as application state.
pub type SharedStore = Arc<dyn Store>;

/// Finish a unit of work according to the outcome of the work done in it.
///
/// On success the unit is committed and the value returned; on failure it is
/// rolled back and the original error returned. A rollback failure is logged
/// and does not mask the original error.
pub async fn finish<T>(
    unit: Box<dyn UnitOfWork>,
    outcome: Result<T, AppError>,
) -> Result<T, AppError> {
    match outcome {
        Ok(value) => {
            unit.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = unit.rollback().await {
                tracing::error!("rollback failed after {err}: {rollback_err}");
            }
            Err(err)
        }
    }
}
