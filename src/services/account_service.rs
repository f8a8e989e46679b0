//! Account management.
//!
//! Balances are never edited here. An account's balance starts at its
//! initial balance and afterwards only moves through
//! [`post_to_account`](crate::services::transaction_service::post_to_account).

use uuid::Uuid;

use crate::{
    error::AppError,
    models::account::{Account, CreateAccountRequest, UpdateAccountRequest},
    store::{Store, finish},
};

#[tracing::instrument(skip(store, request), fields(account_type = %request.account_type))]
pub async fn create_account(
    store: &dyn Store,
    user_id: Uuid,
    request: CreateAccountRequest,
) -> Result<Account, AppError> {
    request.validate()?;
    let account = Account::new(
        user_id,
        request.account_name.trim().to_string(),
        request.account_type,
        request.initial_balance,
    );

    let mut unit = store.begin().await?;
    let outcome = unit.insert_account(&account).await;
    finish(unit, outcome).await?;

    tracing::info!(account_id = %account.id, "account created");
    Ok(account)
}

pub async fn get_account(
    store: &dyn Store,
    user_id: Uuid,
    account_id: Uuid,
) -> Result<Account, AppError> {
    let mut unit = store.begin().await?;
    let outcome = unit
        .find_account(account_id, user_id)
        .await
        .and_then(|found| found.ok_or(AppError::AccountNotFound));
    finish(unit, outcome).await
}

/// All of the user's accounts, newest first.
pub async fn list_accounts(store: &dyn Store, user_id: Uuid) -> Result<Vec<Account>, AppError> {
    let mut unit = store.begin().await?;
    let outcome = unit.list_accounts(user_id).await;
    finish(unit, outcome).await
}

/// Rename, retype or archive an account.
///
/// # Errors
///
/// - `AccountNotFound`: account missing or owned by someone else
/// - `InvalidRequest`: name is blank or too long
#[tracing::instrument(skip(store, request))]
pub async fn update_account(
    store: &dyn Store,
    user_id: Uuid,
    account_id: Uuid,
    request: UpdateAccountRequest,
) -> Result<Account, AppError> {
    request.validate()?;

    let mut unit = store.begin().await?;
    let outcome = async {
        let mut account = unit
            .find_account(account_id, user_id)
            .await?
            .ok_or(AppError::AccountNotFound)?;
        account.account_name = request.account_name.trim().to_string();
        account.account_type = request.account_type;
        account.is_active = request.is_active;
        unit.save_account(&account).await?;
        Ok::<_, AppError>(account)
    }
    .await;
    finish(unit, outcome).await
}

/// Delete an account that no transaction references.
///
/// # Errors
///
/// - `AccountNotFound`: account missing or owned by someone else
/// - `Conflict`: transactions still post to the account; archive it instead
#[tracing::instrument(skip(store))]
pub async fn delete_account(
    store: &dyn Store,
    user_id: Uuid,
    account_id: Uuid,
) -> Result<(), AppError> {
    let mut unit = store.begin().await?;
    let outcome = async {
        if unit.find_account(account_id, user_id).await?.is_none() {
            return Err(AppError::AccountNotFound);
        }
        if unit.account_in_use(account_id, user_id).await? {
            return Err(AppError::Conflict(
                "Account has transactions; archive it instead".to_string(),
            ));
        }
        unit.delete_account(account_id, user_id).await?;
        Ok::<_, AppError>(())
    }
    .await;
    finish(unit, outcome).await?;

    tracing::info!(%account_id, "account deleted");
    Ok(())
}
