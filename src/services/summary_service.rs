//! Income/expense summary over all of a user's transactions.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    error::AppError,
    models::{summary::Summary, transaction::TransactionType},
    store::{Store, finish},
};

/// Totals and per-category breakdowns.
///
/// Transactions and categories are read in one snapshot unit of work, so a
/// delete committed between the two reads cannot show up in only one of them. Categories sharing a name are summed under
/// that name.
///
/// # Errors
///
/// - `Inconsistent`: a transaction references a category the user does not have
#[tracing::instrument(skip(store))]
pub async fn get_summary(store: &dyn Store, user_id: Uuid) -> Result<Summary, AppError> {
    let mut unit = store.begin_snapshot().await?;
    let outcome = async {
        let transactions = unit.list_transactions(user_id).await?;
        let categories = unit.list_categories(user_id).await?;
        let names: HashMap<Uuid, String> =
            categories.into_iter().map(|c| (c.id, c.name)).collect();

        let mut summary = Summary::default();
        for transaction in &transactions {
            let name = names.get(&transaction.category_id).ok_or_else(|| {
                AppError::Inconsistent(format!(
                    "transaction {} references missing category {}",
                    transaction.id, transaction.category_id
                ))
            })?;

            let (total, by_category) = match transaction.transaction_type {
                TransactionType::Income => {
                    (&mut summary.total_income, &mut summary.income_by_category)
                }
                TransactionType::Expense => {
                    (&mut summary.total_expenses, &mut summary.expenses_by_category)
                }
            };
            *total = add(*total, transaction.amount)?;
            let slot = by_category.entry(name.clone()).or_insert(0);
            *slot = add(*slot, transaction.amount)?;
        }
        summary.balance = summary
            .total_income
            .checked_sub(summary.total_expenses)
            .ok_or_else(overflow)?;

        Ok::<_, AppError>(summary)
    }
    .await;
    finish(unit, outcome).await
}

fn add(total: i64, amount: i64) -> Result<i64, AppError> {
    total.checked_add(amount).ok_or_else(overflow)
}

fn overflow() -> AppError {
    AppError::Inconsistent("summary totals overflow".to_string())
}
