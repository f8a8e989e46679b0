//! Transaction service - the ledger that keeps account balances in step
//! with the transactions posted against them.
//!
//! This service handles:
//! - Posting and reversing balance impacts
//! - Creating, updating and deleting transactions atomically with those postings
//! - Filtered, paginated listing
//!
//! # Balance Invariant
//!
//! For every account, `current_balance == initial_balance + Σ signed_impact`
//! over the transactions that reference it. The only code that moves a
//! balance is [`post_to_account`], and it only runs inside a unit of work
//! that also writes the transaction row. A failure anywhere in the
//! operation rolls back every write made by it.

use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        pagination::{PageRequest, PaginatedList},
        transaction::{Transaction, TransactionFilter, TransactionRequest, TransactionResponse},
    },
    store::{Store, UnitOfWork, finish},
};

/// Direction of a balance posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Posting {
    /// Post the impact of a new or updated transaction.
    Apply,
    /// Undo the impact of a transaction that was already recorded.
    Reverse,
    /// Post the updated impact back to the account that already carries the
    /// transaction. Allowed on archived accounts.
    Restate,
}

/// Add `delta` to an account balance.
///
/// The caller passes the transaction's signed impact for every posting;
/// `Reverse` negates it.
///
/// # Errors
///
/// - `AccountNotFound`: `Apply` to an account that is missing or owned by someone else
/// - `Inconsistent`: `Reverse` or `Restate` against an account that no longer exists
/// - `InvalidRequest`: `Apply` to an archived account, or the balance would overflow
pub async fn post_to_account(
    unit: &mut dyn UnitOfWork,
    user_id: Uuid,
    account_id: Uuid,
    delta: i64,
    posting: Posting,
) -> Result<(), AppError> {
    let Some(mut account) = unit.find_account(account_id, user_id).await? else {
        return Err(match posting {
            Posting::Apply => AppError::AccountNotFound,
            Posting::Reverse | Posting::Restate => AppError::Inconsistent(format!(
                "account {account_id} referenced by a recorded transaction no longer exists"
            )),
        });
    };

    let delta = match posting {
        Posting::Apply => {
            if !account.is_active {
                return Err(AppError::InvalidRequest(
                    "Account is archived and accepts no new transactions".to_string(),
                ));
            }
            delta
        }
        Posting::Reverse => -delta,
        Posting::Restate => delta,
    };

    account.current_balance = account
        .current_balance
        .checked_add(delta)
        .ok_or_else(|| AppError::InvalidRequest("Account balance would overflow".to_string()))?;
    unit.save_account(&account).await?;

    tracing::debug!(%account_id, delta, balance = account.current_balance, "posted to account");
    Ok(())
}

async fn resolve_category_name(
    unit: &mut dyn UnitOfWork,
    category_id: Uuid,
    user_id: Uuid,
) -> Result<String, AppError> {
    unit.find_category(category_id, user_id)
        .await?
        .map(|c| c.name)
        .ok_or(AppError::CategoryNotFound)
}

/// Record a new transaction and post it to its account, if it has one.
///
/// # Process
///
/// 1. Validate the amount
/// 2. Open a unit of work
/// 3. Resolve the category
/// 4. Post the signed impact to the account
/// 5. Insert the transaction
/// 6. Commit (or roll back on error)
///
/// # Errors
///
/// - `InvalidRequest`: amount is zero or negative, or the account is archived
/// - `CategoryNotFound` / `AccountNotFound`: reference missing or not owned
#[tracing::instrument(skip(store, request), fields(amount = request.amount))]
pub async fn create_transaction(
    store: &dyn Store,
    user_id: Uuid,
    request: TransactionRequest,
) -> Result<TransactionResponse, AppError> {
    request.validate()?;

    let mut unit = store.begin().await?;
    let outcome = create_in(unit.as_mut(), user_id, request).await;
    let response = finish(unit, outcome).await?;

    tracing::info!(transaction_id = %response.id, "transaction created");
    Ok(response)
}

async fn create_in(
    unit: &mut dyn UnitOfWork,
    user_id: Uuid,
    request: TransactionRequest,
) -> Result<TransactionResponse, AppError> {
    let category_name = resolve_category_name(unit, request.category_id, user_id).await?;
    let transaction = request.into_transaction(user_id);

    if let Some(account_id) = transaction.account_id {
        post_to_account(
            unit,
            user_id,
            account_id,
            transaction.signed_impact(),
            Posting::Apply,
        )
        .await?;
    }

    unit.insert_transaction(&transaction).await?;
    Ok(TransactionResponse::new(transaction, category_name))
}

/// Replace every field of a transaction, moving its balance impact.
///
/// # Process
///
/// 1. Load the existing transaction (locked)
/// 2. Resolve the new category
/// 3. Reverse the old impact on the old account
/// 4. Apply the new impact on the new account
/// 5. Save and commit
///
/// When old and new account are the same, it gets two separate
/// adjustments; the net effect is `new_impact - old_impact`. That account
/// may be archived. When they differ, both rows are locked in id order
/// before either is posted.
///
/// # Errors
///
/// - `TransactionNotFound`, `CategoryNotFound`, `AccountNotFound`
/// - `Inconsistent`: the old account vanished
/// - `InvalidRequest`: validation failure, or moving onto an archived account
#[tracing::instrument(skip(store, request))]
pub async fn update_transaction(
    store: &dyn Store,
    user_id: Uuid,
    transaction_id: Uuid,
    request: TransactionRequest,
) -> Result<TransactionResponse, AppError> {
    request.validate()?;

    let mut unit = store.begin().await?;
    let outcome = update_in(unit.as_mut(), user_id, transaction_id, request).await;
    let response = finish(unit, outcome).await?;

    tracing::info!(%transaction_id, "transaction updated");
    Ok(response)
}

async fn update_in(
    unit: &mut dyn UnitOfWork,
    user_id: Uuid,
    transaction_id: Uuid,
    request: TransactionRequest,
) -> Result<TransactionResponse, AppError> {
    let mut transaction = unit
        .find_transaction(transaction_id, user_id)
        .await?
        .ok_or(AppError::TransactionNotFound)?;
    let category_name = resolve_category_name(unit, request.category_id, user_id).await?;

    if let (Some(old_account), Some(new_account)) = (transaction.account_id, request.account_id) {
        if old_account != new_account {
            for account_id in lock_order(old_account, new_account) {
                unit.find_account(account_id, user_id).await?;
            }
        }
    }

    if let Some(old_account) = transaction.account_id {
        post_to_account(
            unit,
            user_id,
            old_account,
            transaction.signed_impact(),
            Posting::Reverse,
        )
        .await?;
    }
    if let Some(new_account) = request.account_id {
        let posting = if transaction.account_id == Some(new_account) {
            Posting::Restate
        } else {
            Posting::Apply
        };
        post_to_account(unit, user_id, new_account, request.signed_impact(), posting).await?;
    }

    transaction.apply_request(request);
    unit.save_transaction(&transaction).await?;
    Ok(TransactionResponse::new(transaction, category_name))
}

/// Order in which two account rows are locked.
fn lock_order(a: Uuid, b: Uuid) -> [Uuid; 2] {
    if a <= b { [a, b] } else { [b, a] }
}

/// Delete a transaction and reverse its balance impact.
///
/// Returns `false` when the transaction does not exist (or is not owned);
/// nothing is written in that case.
///
/// # Errors
///
/// - `Inconsistent`: the transaction's account no longer exists
#[tracing::instrument(skip(store))]
pub async fn delete_transaction(
    store: &dyn Store,
    user_id: Uuid,
    transaction_id: Uuid,
) -> Result<bool, AppError> {
    let mut unit = store.begin().await?;
    let outcome = delete_in(unit.as_mut(), user_id, transaction_id).await;
    let deleted = finish(unit, outcome).await?;

    if deleted {
        tracing::info!(%transaction_id, "transaction deleted");
    }
    Ok(deleted)
}

async fn delete_in(
    unit: &mut dyn UnitOfWork,
    user_id: Uuid,
    transaction_id: Uuid,
) -> Result<bool, AppError> {
    let Some(transaction) = unit.find_transaction(transaction_id, user_id).await? else {
        return Ok(false);
    };

    if let Some(account_id) = transaction.account_id {
        post_to_account(
            unit,
            user_id,
            account_id,
            transaction.signed_impact(),
            Posting::Reverse,
        )
        .await?;
    }

    unit.delete_transaction(transaction_id, user_id).await
}

/// Get one transaction with its category name.
pub async fn get_transaction(
    store: &dyn Store,
    user_id: Uuid,
    transaction_id: Uuid,
) -> Result<TransactionResponse, AppError> {
    let mut unit = store.begin().await?;
    let outcome = async {
        let transaction = unit
            .find_transaction(transaction_id, user_id)
            .await?
            .ok_or(AppError::TransactionNotFound)?;
        let name = resolve_recorded_category(unit.as_mut(), &transaction).await?;
        Ok::<_, AppError>(TransactionResponse::new(transaction, name))
    }
    .await;
    finish(unit, outcome).await
}

/// One page of the user's transactions matching `filter`, ordered by date.
pub async fn list_transactions(
    store: &dyn Store,
    user_id: Uuid,
    filter: TransactionFilter,
    page: PageRequest,
) -> Result<PaginatedList<TransactionResponse>, AppError> {
    let mut unit = store.begin_snapshot().await?;
    let outcome = async {
        let (items, total) = unit.query_transactions(user_id, &filter, page).await?;
        let mut responses = Vec::with_capacity(items.len());
        for transaction in items {
            let name = resolve_recorded_category(unit.as_mut(), &transaction).await?;
            responses.push(TransactionResponse::new(transaction, name));
        }
        Ok::<_, AppError>(PaginatedList::new(responses, total, page))
    }
    .await;
    finish(unit, outcome).await
}

/// A stored transaction must always point at an existing category.
async fn resolve_recorded_category(
    unit: &mut dyn UnitOfWork,
    transaction: &Transaction,
) -> Result<String, AppError> {
    unit.find_category(transaction.category_id, transaction.user_id)
        .await?
        .map(|c| c.name)
        .ok_or_else(|| {
            AppError::Inconsistent(format!(
                "transaction {} references missing category {}",
                transaction.id, transaction.category_id
            ))
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        models::{
            account::{Account, AccountType},
            category::Category,
            transaction::TransactionType,
        },
        store::{FailPoint, MemoryStore},
    };

    struct Fixture {
        store: MemoryStore,
        user_id: Uuid,
        category_id: Uuid,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = MemoryStore::new();
            let user_id = Uuid::new_v4();
            let category = Category::new(user_id, "Food".into());
            let mut unit = store.begin().await.unwrap();
            unit.insert_category(&category).await.unwrap();
            unit.commit().await.unwrap();
            Self {
                store,
                user_id,
                category_id: category.id,
            }
        }

        async fn account(&self, initial_balance: i64) -> Uuid {
            let account = Account::new(
                self.user_id,
                "Checking".into(),
                AccountType::Checking,
                initial_balance,
            );
            let mut unit = self.store.begin().await.unwrap();
            unit.insert_account(&account).await.unwrap();
            unit.commit().await.unwrap();
            account.id
        }

        async fn balance(&self, account_id: Uuid) -> i64 {
            let mut unit = self.store.begin().await.unwrap();
            unit.find_account(account_id, self.user_id)
                .await
                .unwrap()
                .unwrap()
                .current_balance
        }

        fn request(
            &self,
            amount: i64,
            transaction_type: TransactionType,
            account_id: Option<Uuid>,
        ) -> TransactionRequest {
            TransactionRequest {
                amount,
                transaction_type,
                category_id: self.category_id,
                account_id,
                date: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
                description: String::new(),
            }
        }

        async fn archive(&self, account_id: Uuid) {
            let mut unit = self.store.begin().await.unwrap();
            let mut account = unit.find_account(account_id, self.user_id).await.unwrap().unwrap();
            account.is_active = false;
            unit.save_account(&account).await.unwrap();
            unit.commit().await.unwrap();
        }

        async fn create(
            &self,
            amount: i64,
            transaction_type: TransactionType,
            account_id: Option<Uuid>,
        ) -> Result<TransactionResponse, AppError> {
            create_transaction(
                &self.store,
                self.user_id,
                self.request(amount, transaction_type, account_id),
            )
            .await
        }
    }

    #[tokio::test]
    async fn income_and_expense_move_the_balance() {
        let fx = Fixture::new().await;
        let account = fx.account(1000).await;

        fx.create(200, TransactionType::Income, Some(account)).await.unwrap();
        assert_eq!(fx.balance(account).await, 1200);

        fx.create(300, TransactionType::Expense, Some(account)).await.unwrap();
        assert_eq!(fx.balance(account).await, 900);
    }

    #[tokio::test]
    async fn deleting_income_reverses_it() {
        let fx = Fixture::new().await;
        let account = fx.account(1000).await;

        let income = fx.create(200, TransactionType::Income, Some(account)).await.unwrap();
        fx.create(300, TransactionType::Expense, Some(account)).await.unwrap();
        assert!(delete_transaction(&fx.store, fx.user_id, income.id).await.unwrap());
        assert_eq!(fx.balance(account).await, 700);
    }

    #[tokio::test]
    async fn create_then_delete_leaves_balance_unchanged() {
        let fx = Fixture::new().await;
        let account = fx.account(500).await;

        let created = fx.create(75, TransactionType::Expense, Some(account)).await.unwrap();
        delete_transaction(&fx.store, fx.user_id, created.id).await.unwrap();
        assert_eq!(fx.balance(account).await, 500);
    }

    #[tokio::test]
    async fn update_moves_balance_by_the_difference() {
        let fx = Fixture::new().await;
        let account = fx.account(1000).await;

        let expense = fx.create(100, TransactionType::Expense, Some(account)).await.unwrap();
        assert_eq!(fx.balance(account).await, 900);

        let request = fx.request(150, TransactionType::Expense, Some(account));
        let updated = update_transaction(&fx.store, fx.user_id, expense.id, request)
            .await
            .unwrap();
        assert_eq!(updated.amount, 150);
        assert_eq!(fx.balance(account).await, 850);
    }

    #[tokio::test]
    async fn update_can_flip_the_type() {
        let fx = Fixture::new().await;
        let account = fx.account(0).await;

        let created = fx.create(40, TransactionType::Expense, Some(account)).await.unwrap();
        let request = fx.request(40, TransactionType::Income, Some(account));
        update_transaction(&fx.store, fx.user_id, created.id, request)
            .await
            .unwrap();
        assert_eq!(fx.balance(account).await, 40);
    }

    #[tokio::test]
    async fn moving_between_accounts_shifts_the_impact() {
        let fx = Fixture::new().await;
        let a = fx.account(1000).await;
        let b = fx.account(1000).await;

        let created = fx.create(100, TransactionType::Expense, Some(a)).await.unwrap();
        let request = fx.request(120, TransactionType::Expense, Some(b));
        update_transaction(&fx.store, fx.user_id, created.id, request)
            .await
            .unwrap();

        assert_eq!(fx.balance(a).await, 1000);
        assert_eq!(fx.balance(b).await, 880);
    }

    #[tokio::test]
    async fn detaching_from_an_account_reverses_the_impact() {
        let fx = Fixture::new().await;
        let account = fx.account(1000).await;

        let created = fx.create(100, TransactionType::Income, Some(account)).await.unwrap();
        let request = fx.request(100, TransactionType::Income, None);
        let updated = update_transaction(&fx.store, fx.user_id, created.id, request)
            .await
            .unwrap();

        assert!(updated.account_id.is_none());
        assert_eq!(fx.balance(account).await, 1000);
    }

    #[tokio::test]
    async fn transaction_without_account_touches_no_balance() {
        let fx = Fixture::new().await;
        let account = fx.account(1000).await;

        let created = fx.create(60, TransactionType::Expense, None).await.unwrap();
        assert_eq!(created.category_name, "Food");
        assert_eq!(fx.balance(account).await, 1000);
    }

    #[tokio::test]
    async fn unknown_category_is_rejected_without_writes() {
        let fx = Fixture::new().await;
        let account = fx.account(1000).await;

        let mut request = fx.request(10, TransactionType::Expense, Some(account));
        request.category_id = Uuid::new_v4();
        let err = create_transaction(&fx.store, fx.user_id, request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CategoryNotFound));
        assert_eq!(fx.balance(account).await, 1000);
    }

    #[tokio::test]
    async fn account_of_another_user_is_not_found() {
        let fx = Fixture::new().await;
        let foreign = Account::new(Uuid::new_v4(), "Theirs".into(), AccountType::Cash, 50);
        let mut unit = fx.store.begin().await.unwrap();
        unit.insert_account(&foreign).await.unwrap();
        unit.commit().await.unwrap();

        let err = fx
            .create(10, TransactionType::Income, Some(foreign.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AccountNotFound));
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected() {
        let fx = Fixture::new().await;
        let err = fx.create(0, TransactionType::Income, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn archived_account_rejects_new_postings_but_allows_reversal() {
        let fx = Fixture::new().await;
        let account_id = fx.account(1000).await;
        let created = fx.create(100, TransactionType::Expense, Some(account_id)).await.unwrap();
        fx.archive(account_id).await;

        let err = fx
            .create(5, TransactionType::Expense, Some(account_id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));

        assert!(delete_transaction(&fx.store, fx.user_id, created.id).await.unwrap());
        assert_eq!(fx.balance(account_id).await, 1000);
    }

    #[tokio::test]
    async fn editing_a_transaction_on_an_archived_account_keeps_it_there() {
        let fx = Fixture::new().await;
        let account_id = fx.account(1000).await;
        let created = fx.create(100, TransactionType::Expense, Some(account_id)).await.unwrap();
        fx.archive(account_id).await;

        let mut request = fx.request(100, TransactionType::Expense, Some(account_id));
        request.description = "groceries".into();
        let updated = update_transaction(&fx.store, fx.user_id, created.id, request)
            .await
            .unwrap();
        assert_eq!(updated.description, "groceries");
        assert_eq!(fx.balance(account_id).await, 900);

        let request = fx.request(40, TransactionType::Expense, Some(account_id));
        update_transaction(&fx.store, fx.user_id, created.id, request)
            .await
            .unwrap();
        assert_eq!(fx.balance(account_id).await, 960);
    }

    #[tokio::test]
    async fn moving_onto_an_archived_account_is_rejected() {
        let fx = Fixture::new().await;
        let open = fx.account(1000).await;
        let archived = fx.account(1000).await;
        let created = fx.create(100, TransactionType::Expense, Some(open)).await.unwrap();
        fx.archive(archived).await;

        let request = fx.request(100, TransactionType::Expense, Some(archived));
        let err = update_transaction(&fx.store, fx.user_id, created.id, request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert_eq!(fx.balance(open).await, 900);
        assert_eq!(fx.balance(archived).await, 1000);
    }

    #[tokio::test]
    async fn balance_overflow_is_rejected() {
        let fx = Fixture::new().await;
        let account = fx.account(i64::MAX - 5).await;

        let err = fx.create(10, TransactionType::Income, Some(account)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert_eq!(fx.balance(account).await, i64::MAX - 5);
    }

    #[tokio::test]
    async fn deleting_a_missing_transaction_returns_false() {
        let fx = Fixture::new().await;
        assert!(!delete_transaction(&fx.store, fx.user_id, Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn updating_a_missing_transaction_is_not_found() {
        let fx = Fixture::new().await;
        let request = fx.request(10, TransactionType::Income, None);
        let err = update_transaction(&fx.store, fx.user_id, Uuid::new_v4(), request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TransactionNotFound));
    }

    #[tokio::test]
    async fn deleting_when_the_account_vanished_is_inconsistent() {
        let fx = Fixture::new().await;
        let account = fx.account(1000).await;
        let created = fx.create(100, TransactionType::Expense, Some(account)).await.unwrap();

        fx.store.remove_account_unchecked(account).await;

        let err = delete_transaction(&fx.store, fx.user_id, created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Inconsistent(_)));

        // The transaction is still there.
        assert!(get_transaction(&fx.store, fx.user_id, created.id).await.is_ok());
    }

    #[tokio::test]
    async fn updating_when_the_old_account_vanished_is_inconsistent() {
        let fx = Fixture::new().await;
        let gone = fx.account(1000).await;
        let other = fx.account(1000).await;
        let mut request = fx.request(100, TransactionType::Expense, Some(gone));
        request.description = "x".into();
        let created = create_transaction(&fx.store, fx.user_id, request).await.unwrap();

        fx.store.remove_account_unchecked(gone).await;

        let mut request = fx.request(50, TransactionType::Expense, Some(other));
        request.description = "y".into();
        let err = update_transaction(&fx.store, fx.user_id, created.id, request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Inconsistent(_)));

        let stored = get_transaction(&fx.store, fx.user_id, created.id).await.unwrap();
        assert_eq!(stored.account_id, Some(gone));
        assert_eq!(stored.amount, 100);
        assert_eq!(stored.description, "x");
        assert_eq!(fx.balance(other).await, 1000);
    }

    #[tokio::test]
    async fn reading_a_transaction_whose_category_vanished_is_inconsistent() {
        let fx = Fixture::new().await;
        let created = fx.create(10, TransactionType::Income, None).await.unwrap();

        fx.store.remove_category_unchecked(fx.category_id).await;

        let err = get_transaction(&fx.store, fx.user_id, created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Inconsistent(_)));

        let page = PageRequest { page: 1, page_size: 10 };
        let err = list_transactions(&fx.store, fx.user_id, TransactionFilter::default(), page)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Inconsistent(_)));
    }

    #[tokio::test]
    async fn failed_insert_leaves_balance_untouched() {
        let fx = Fixture::new().await;
        let account = fx.account(1000).await;

        fx.store.fail_next(FailPoint::InsertTransaction);
        let err = fx.create(100, TransactionType::Expense, Some(account)).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(fx.balance(account).await, 1000);

        let page = PageRequest { page: 1, page_size: 10 };
        let listed = list_transactions(&fx.store, fx.user_id, TransactionFilter::default(), page)
            .await
            .unwrap();
        assert_eq!(listed.total_count, 0);
    }

    #[tokio::test]
    async fn failed_balance_write_records_nothing() {
        let fx = Fixture::new().await;
        let account = fx.account(1000).await;

        fx.store.fail_next(FailPoint::SaveAccount);
        assert!(fx.create(100, TransactionType::Income, Some(account)).await.is_err());

        let page = PageRequest { page: 1, page_size: 10 };
        let listed = list_transactions(&fx.store, fx.user_id, TransactionFilter::default(), page)
            .await
            .unwrap();
        assert!(listed.items.is_empty());
        assert_eq!(fx.balance(account).await, 1000);
    }

    #[tokio::test]
    async fn failed_save_rolls_back_both_postings() {
        let fx = Fixture::new().await;
        let a = fx.account(1000).await;
        let b = fx.account(1000).await;
        let created = fx.create(100, TransactionType::Expense, Some(a)).await.unwrap();

        fx.store.fail_next(FailPoint::SaveTransaction);
        let request = fx.request(300, TransactionType::Expense, Some(b));
        assert!(update_transaction(&fx.store, fx.user_id, created.id, request)
            .await
            .is_err());

        assert_eq!(fx.balance(a).await, 900);
        assert_eq!(fx.balance(b).await, 1000);
    }

    #[tokio::test]
    async fn failed_delete_or_commit_keeps_the_balance() {
        let fx = Fixture::new().await;
        let account = fx.account(1000).await;
        let created = fx.create(100, TransactionType::Income, Some(account)).await.unwrap();

        fx.store.fail_next(FailPoint::DeleteTransaction);
        assert!(delete_transaction(&fx.store, fx.user_id, created.id).await.is_err());
        assert_eq!(fx.balance(account).await, 1100);

        fx.store.fail_next(FailPoint::Commit);
        assert!(delete_transaction(&fx.store, fx.user_id, created.id).await.is_err());
        assert_eq!(fx.balance(account).await, 1100);
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let fx = Fixture::new().await;
        for amount in 1..=25 {
            let kind = if amount % 2 == 0 {
                TransactionType::Income
            } else {
                TransactionType::Expense
            };
            fx.create(amount, kind, None).await.unwrap();
        }

        let page = PageRequest { page: 2, page_size: 10 };
        let listed = list_transactions(&fx.store, fx.user_id, TransactionFilter::default(), page)
            .await
            .unwrap();
        assert_eq!(listed.items.len(), 10);
        assert_eq!(listed.total_pages, 3);
        assert!(listed.has_previous_page);
        assert!(listed.has_next_page);

        let filter = TransactionFilter {
            transaction_type: Some(TransactionType::Income),
            ..Default::default()
        };
        let page = PageRequest { page: 1, page_size: 100 };
        let income = list_transactions(&fx.store, fx.user_id, filter, page)
            .await
            .unwrap();
        assert_eq!(income.total_count, 12);
        assert!(income.items.iter().all(|t| t.transaction_type == TransactionType::Income));
    }

    #[tokio::test]
    async fn concurrent_creates_all_land() {
        let fx = Arc::new(Fixture::new().await);
        let account = fx.account(0).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let fx = fx.clone();
            handles.push(tokio::spawn(async move {
                fx.create(5, TransactionType::Income, Some(account)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(fx.balance(account).await, 100);
    }

    #[test]
    fn account_locks_follow_id_order() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        assert_eq!(lock_order(low, high), [low, high]);
        assert_eq!(lock_order(high, low), [low, high]);
    }

    #[tokio::test]
    async fn opposite_moves_between_two_accounts_all_land() {
        let fx = Arc::new(Fixture::new().await);
        let a = fx.account(1000).await;
        let b = fx.account(1000).await;

        let mut moves = Vec::new();
        for i in 0..10 {
            let (from, to, amount) = if i % 2 == 0 { (a, b, 10) } else { (b, a, 20) };
            let created = fx.create(amount, TransactionType::Expense, Some(from)).await.unwrap();
            moves.push((created.id, to, amount));
        }
        assert_eq!(fx.balance(a).await, 950);
        assert_eq!(fx.balance(b).await, 900);

        let mut handles = Vec::new();
        for (id, to, amount) in moves {
            let fx = fx.clone();
            handles.push(tokio::spawn(async move {
                let request = fx.request(amount, TransactionType::Expense, Some(to));
                update_transaction(&fx.store, fx.user_id, id, request).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(fx.balance(a).await, 900);
        assert_eq!(fx.balance(b).await, 950);
    }
}
