//! Financial goal management.
//!
//! Goals are independent of balances: creating or editing one never touches
//! an account. They only require their category to exist.

use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        goal::{FinancialGoal, GoalFilter, GoalRequest},
        pagination::{PageRequest, PaginatedList},
    },
    store::{Store, UnitOfWork, finish},
};

async fn require_category(
    unit: &mut dyn UnitOfWork,
    category_id: Uuid,
    user_id: Uuid,
) -> Result<(), AppError> {
    match unit.find_category(category_id, user_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::CategoryNotFound),
    }
}

/// # Errors
///
/// - `InvalidRequest`: non-positive amount or end date before start date
/// - `CategoryNotFound`
#[tracing::instrument(skip(store, request), fields(period = %request.period))]
pub async fn create_goal(
    store: &dyn Store,
    user_id: Uuid,
    request: GoalRequest,
) -> Result<FinancialGoal, AppError> {
    request.validate()?;

    let mut unit = store.begin().await?;
    let outcome = async {
        require_category(unit.as_mut(), request.category_id, user_id).await?;
        let goal = request.into_goal(user_id);
        unit.insert_goal(&goal).await?;
        Ok::<_, AppError>(goal)
    }
    .await;
    let goal = finish(unit, outcome).await?;

    tracing::info!(goal_id = %goal.id, "goal created");
    Ok(goal)
}

pub async fn get_goal(
    store: &dyn Store,
    user_id: Uuid,
    goal_id: Uuid,
) -> Result<FinancialGoal, AppError> {
    let mut unit = store.begin().await?;
    let outcome = unit
        .find_goal(goal_id, user_id)
        .await
        .and_then(|found| found.ok_or(AppError::GoalNotFound));
    finish(unit, outcome).await
}

/// Overwrite every field of a goal.
#[tracing::instrument(skip(store, request))]
pub async fn update_goal(
    store: &dyn Store,
    user_id: Uuid,
    goal_id: Uuid,
    request: GoalRequest,
) -> Result<FinancialGoal, AppError> {
    request.validate()?;

    let mut unit = store.begin().await?;
    let outcome = async {
        let mut goal = unit
            .find_goal(goal_id, user_id)
            .await?
            .ok_or(AppError::GoalNotFound)?;
        require_category(unit.as_mut(), request.category_id, user_id).await?;
        goal.apply_request(request);
        unit.save_goal(&goal).await?;
        Ok::<_, AppError>(goal)
    }
    .await;
    finish(unit, outcome).await
}

#[tracing::instrument(skip(store))]
pub async fn delete_goal(store: &dyn Store, user_id: Uuid, goal_id: Uuid) -> Result<(), AppError> {
    let mut unit = store.begin().await?;
    let outcome = unit.delete_goal(goal_id, user_id).await.and_then(|deleted| {
        if deleted {
            Ok(())
        } else {
            Err(AppError::GoalNotFound)
        }
    });
    finish(unit, outcome).await
}

/// One page of goals matching `filter`, ordered by start date.
pub async fn list_goals(
    store: &dyn Store,
    user_id: Uuid,
    filter: GoalFilter,
    page: PageRequest,
) -> Result<PaginatedList<FinancialGoal>, AppError> {
    let mut unit = store.begin().await?;
    let outcome = unit
        .query_goals(user_id, &filter, page)
        .await
        .map(|(items, total)| PaginatedList::new(items, total, page));
    finish(unit, outcome).await
}
