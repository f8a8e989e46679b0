//! In-memory store.
//!
//! A unit of work takes an owned lock on the whole state and works on a
//! private copy of it; commit swaps the copy in, rollback (or drop) throws
//! it away. Units of work are therefore fully serialised, which is stronger
//! than the row locking the PostgreSQL store relies on.
//!
//! Intended for tests/dev. Not optimized for performance: every `begin`
//! clones the state.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{Store, UnitOfWork};
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

/// Named write steps where a one-shot failure can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    SaveAccount,
    InsertTransaction,
    SaveTransaction,
    DeleteTransaction,
    Commit,
}

#[derive(Debug, Default, Clone)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    accounts: HashMap<Uuid, Account>,
    categories: HashMap<Uuid, Category>,
    transactions: HashMap<Uuid, Transaction>,
    goals: HashMap<Uuid, FinancialGoal>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_point: Arc<StdMutex<Option<FailPoint>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next unit of work that reaches `point` fail there with a
    /// storage error. Fires once.
    pub fn fail_next(&self, point: FailPoint) {
        if let Ok(mut armed) = self.fail_point.lock() {
            *armed = Some(point);
        }
    }

    /// Drop an account without any reference checks, leaving its
    /// transactions dangling.
    #[cfg(test)]
    pub(crate) async fn remove_account_unchecked(&self, id: Uuid) {
        self.state.lock().await.accounts.remove(&id);
    }

    #[cfg(test)]
    pub(crate) async fn remove_category_unchecked(&self, id: Uuid) {
        self.state.lock().await.categories.remove(&id);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            working,
            fail_point: self.fail_point.clone(),
        }))
    }

    /// The state lock is held for the whole unit, so every unit is a snapshot.
    async fn begin_snapshot(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        self.begin().await
    }

    async fn find_user_by_key_hash(&self, key_hash: &str) -> Result<Option<User>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.key_hash == key_hash && u.is_active)
            .cloned())
    }

    async fn register_user(&self, display_name: &str, key_hash: &str) -> Result<User, AppError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.users.values_mut().find(|u| u.key_hash == key_hash) {
            existing.display_name = display_name.to_string();
            existing.is_active = true;
            return Ok(existing.clone());
        }
        let user = User::new(display_name.to_string(), key_hash.to_string());
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_point: Arc<StdMutex<Option<FailPoint>>>,
}

impl MemoryUnitOfWork {
    fn trip(&self, point: FailPoint) -> Result<(), AppError> {
        let mut armed = self
            .fail_point
            .lock()
            .map_err(|_| AppError::Storage("fail point lock poisoned".to_string()))?;
        if *armed == Some(point) {
            *armed = None;
            return Err(AppError::Storage(format!("injected failure at {point:?}")));
        }
        Ok(())
    }

    fn category_name(&self, id: Uuid) -> Option<&str> {
        self.working.categories.get(&id).map(|c| c.name.as_str())
    }
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    (items.into_iter().skip(offset).take(limit).collect(), total)
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn insert_account(&mut self, account: &Account) -> Result<(), AppError> {
        self.working.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_account(
        &mut self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Account>, AppError> {
        Ok(self
            .working
            .accounts
            .get(&id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }

    async fn list_accounts(&mut self, user_id: Uuid) -> Result<Vec<Account>, AppError> {
        let mut accounts: Vec<Account> = self
            .working
            .accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(accounts)
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), AppError> {
        self.trip(FailPoint::SaveAccount)?;
        self.working.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn delete_account(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let owned = self
            .working
            .accounts
            .get(&id)
            .is_some_and(|a| a.user_id == user_id);
        if owned {
            self.working.accounts.remove(&id);
        }
        Ok(owned)
    }

    async fn account_in_use(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .working
            .transactions
            .values()
            .any(|t| t.user_id == user_id && t.account_id == Some(id)))
    }

    async fn insert_category(&mut self, category: &Category) -> Result<(), AppError> {
        self.working.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn find_category(
        &mut self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Category>, AppError> {
        Ok(self
            .working
            .categories
            .get(&id)
            .filter(|c| c.user_id == user_id)
            .cloned())
    }

    async fn list_categories(&mut self, user_id: Uuid) -> Result<Vec<Category>, AppError> {
        let mut categories: Vec<Category> = self
            .working
            .categories
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn save_category(&mut self, category: &Category) -> Result<(), AppError> {
        self.working.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn delete_category(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let owned = self
            .working
            .categories
            .get(&id)
            .is_some_and(|c| c.user_id == user_id);
        if owned {
            self.working.categories.remove(&id);
        }
        Ok(owned)
    }

    async fn category_in_use(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let by_transaction = self
            .working
            .transactions
            .values()
            .any(|t| t.user_id == user_id && t.category_id == id);
        let by_goal = self
            .working
            .goals
            .values()
            .any(|g| g.user_id == user_id && g.category_id == id);
        Ok(by_transaction || by_goal)
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), AppError> {
        self.trip(FailPoint::InsertTransaction)?;
        self.working
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn find_transaction(
        &mut self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Transaction>, AppError> {
        Ok(self
            .working
            .transactions
            .get(&id)
            .filter(|t| t.user_id == user_id)
            .cloned())
    }

    async fn save_transaction(&mut self, transaction: &Transaction) -> Result<(), AppError> {
        self.trip(FailPoint::SaveTransaction)?;
        self.working
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn delete_transaction(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        self.trip(FailPoint::DeleteTransaction)?;
        let owned = self
            .working
            .transactions
            .get(&id)
            .is_some_and(|t| t.user_id == user_id);
        if owned {
            self.working.transactions.remove(&id);
        }
        Ok(owned)
    }

    async fn list_transactions(&mut self, user_id: Uuid) -> Result<Vec<Transaction>, AppError> {
        self.query_all_transactions(user_id, &TransactionFilter::default())
    }

    async fn query_transactions(
        &mut self,
        user_id: Uuid,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<Transaction>, u64), AppError> {
        let matching = self.query_all_transactions(user_id, filter)?;
        Ok(paginate(matching, page))
    }

    async fn insert_goal(&mut self, goal: &FinancialGoal) -> Result<(), AppError> {
        self.working.goals.insert(goal.id, goal.clone());
        Ok(())
    }

    async fn find_goal(
        &mut self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<FinancialGoal>, AppError> {
        Ok(self
            .working
            .goals
            .get(&id)
            .filter(|g| g.user_id == user_id)
            .cloned())
    }

    async fn save_goal(&mut self, goal: &FinancialGoal) -> Result<(), AppError> {
        self.working.goals.insert(goal.id, goal.clone());
        Ok(())
    }

    async fn delete_goal(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let owned = self
            .working
            .goals
            .get(&id)
            .is_some_and(|g| g.user_id == user_id);
        if owned {
            self.working.goals.remove(&id);
        }
        Ok(owned)
    }

    async fn query_goals(
        &mut self,
        user_id: Uuid,
        filter: &GoalFilter,
        page: PageRequest,
    ) -> Result<(Vec<FinancialGoal>, u64), AppError> {
        let mut matching: Vec<FinancialGoal> = self
            .working
            .goals
            .values()
            .filter(|g| g.user_id == user_id)
            .filter(|g| filter.matches(g, self.category_name(g.category_id)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        Ok(paginate(matching, page))
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.trip(FailPoint::Commit)?;
        let MemoryUnitOfWork {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        Ok(())
    }
}

impl MemoryUnitOfWork {
    fn query_all_transactions(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, AppError> {
        let mut matching: Vec<Transaction> = self
            .working
            .transactions
            .values()
            .filter(|t| t.user_id == user_id)
            .filter(|t| filter.matches(t, self.category_name(t.category_id)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::AccountType;

    fn account(user_id: Uuid) -> Account {
        Account::new(user_id, "Checking".into(), AccountType::Checking, 1000)
    }

    #[tokio::test]
    async fn committed_writes_are_visible_to_the_next_unit() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let account = account(user_id);

        let mut unit = store.begin().await.unwrap();
        unit.insert_account(&account).await.unwrap();
        unit.commit().await.unwrap();

        let mut unit = store.begin().await.unwrap();
        assert_eq!(unit.find_account(account.id, user_id).await.unwrap(), Some(account));
    }

    #[tokio::test]
    async fn rolled_back_writes_are_discarded() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let account = account(user_id);

        let mut unit = store.begin().await.unwrap();
        unit.insert_account(&account).await.unwrap();
        unit.rollback().await.unwrap();

        let mut unit = store.begin().await.unwrap();
        assert!(unit.find_account(account.id, user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dropped_unit_discards_writes() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let account = account(user_id);

        {
            let mut unit = store.begin().await.unwrap();
            unit.insert_account(&account).await.unwrap();
        }

        let mut unit = store.begin().await.unwrap();
        assert!(unit.list_accounts(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookups_are_scoped_to_the_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let account = account(owner);

        let mut unit = store.begin().await.unwrap();
        unit.insert_account(&account).await.unwrap();
        assert!(unit.find_account(account.id, Uuid::new_v4()).await.unwrap().is_none());
        assert!(!unit.delete_account(account.id, Uuid::new_v4()).await.unwrap());
        assert!(unit.delete_account(account.id, owner).await.unwrap());
    }

    #[tokio::test]
    async fn fail_point_fires_once() {
        let store = MemoryStore::new();
        store.fail_next(FailPoint::Commit);

        let unit = store.begin().await.unwrap();
        assert!(matches!(unit.commit().await, Err(AppError::Storage(_))));

        let unit = store.begin().await.unwrap();
        assert!(unit.commit().await.is_ok());
    }

    #[tokio::test]
    async fn register_user_is_idempotent_per_key() {
        let store = MemoryStore::new();
        let first = store.register_user("Ana", "hash").await.unwrap();
        let second = store.register_user("Ana B.", "hash").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.display_name, "Ana B.");

        let found = store.find_user_by_key_hash("hash").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(store.find_user_by_key_hash("other").await.unwrap().is_none());
    }
}
