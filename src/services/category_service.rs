//! Category management.

use uuid::Uuid;

use crate::{
    error::AppError,
    models::category::{Category, CategoryRequest},
    store::{Store, finish},
};

#[tracing::instrument(skip(store, request))]
pub async fn create_category(
    store: &dyn Store,
    user_id: Uuid,
    request: CategoryRequest,
) -> Result<Category, AppError> {
    let category = Category::new(user_id, request.validated_name()?);

    let mut unit = store.begin().await?;
    let outcome = unit.insert_category(&category).await;
    finish(unit, outcome).await?;

    tracing::info!(category_id = %category.id, "category created");
    Ok(category)
}

pub async fn get_category(
    store: &dyn Store,
    user_id: Uuid,
    category_id: Uuid,
) -> Result<Category, AppError> {
    let mut unit = store.begin().await?;
    let outcome = unit
        .find_category(category_id, user_id)
        .await
        .and_then(|found| found.ok_or(AppError::CategoryNotFound));
    finish(unit, outcome).await
}

/// All of the user's categories ordered by name.
pub async fn list_categories(
    store: &dyn Store,
    user_id: Uuid,
) -> Result<Vec<Category>, AppError> {
    let mut unit = store.begin().await?;
    let outcome = unit.list_categories(user_id).await;
    finish(unit, outcome).await
}

/// Rename a category. Transactions and goals keep pointing at it, so
/// listings and summaries pick up the new name immediately.
#[tracing::instrument(skip(store, request))]
pub async fn rename_category(
    store: &dyn Store,
    user_id: Uuid,
    category_id: Uuid,
    request: CategoryRequest,
) -> Result<Category, AppError> {
    let name = request.validated_name()?;

    let mut unit = store.begin().await?;
    let outcome = async {
        let mut category = unit
            .find_category(category_id, user_id)
            .await?
            .ok_or(AppError::CategoryNotFound)?;
        category.name = name;
        unit.save_category(&category).await?;
        Ok::<_, AppError>(category)
    }
    .await;
    finish(unit, outcome).await
}

/// Delete a category nothing refers to.
///
/// # Errors
///
/// - `CategoryNotFound`
/// - `Conflict`: a transaction or goal still uses the category
#[tracing::instrument(skip(store))]
pub async fn delete_category(
    store: &dyn Store,
    user_id: Uuid,
    category_id: Uuid,
) -> Result<(), AppError> {
    let mut unit = store.begin().await?;
    let outcome = async {
        if unit.find_category(category_id, user_id).await?.is_none() {
            return Err(AppError::CategoryNotFound);
        }
        if unit.category_in_use(category_id, user_id).await? {
            return Err(AppError::Conflict(
                "Category is used by transactions or goals".to_string(),
            ));
        }
        unit.delete_category(category_id, user_id).await?;
        Ok::<_, AppError>(())
    }
    .await;
    finish(unit, outcome).await?;

    tracing::info!(%category_id, "category deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{
        models::goal::{GoalPeriod, GoalRequest},
        store::MemoryStore,
    };

    fn named(name: &str) -> CategoryRequest {
        CategoryRequest {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn categories_are_listed_by_name() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        for name in ["Utilities", "Food", "Rent"] {
            create_category(&store, user_id, named(name)).await.unwrap();
        }
        create_category(&store, Uuid::new_v4(), named("Hidden"))
            .await
            .unwrap();

        let names: Vec<String> = list_categories(&store, user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Food", "Rent", "Utilities"]);
    }

    #[tokio::test]
    async fn rename_replaces_the_name() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let category = create_category(&store, user_id, named("Fod")).await.unwrap();

        rename_category(&store, user_id, category.id, named("Food"))
            .await
            .unwrap();
        let fetched = get_category(&store, user_id, category.id).await.unwrap();
        assert_eq!(fetched.name, "Food");
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let store = MemoryStore::new();
        let err = create_category(&store, Uuid::new_v4(), named("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn category_used_by_a_goal_cannot_be_deleted() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let category = create_category(&store, user_id, named("Travel")).await.unwrap();

        let goal = GoalRequest {
            category_id: category.id,
            goal_amount: 1000,
            period: GoalPeriod::Yearly,
            start_date: Utc::now(),
            end_date: Utc::now() + Duration::days(365),
        }
        .into_goal(user_id);
        let mut unit = store.begin().await.unwrap();
        unit.insert_goal(&goal).await.unwrap();
        unit.commit().await.unwrap();

        let err = delete_category(&store, user_id, category.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn unused_category_is_deleted() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let category = create_category(&store, user_id, named("Spare")).await.unwrap();

        delete_category(&store, user_id, category.id).await.unwrap();
        let err = get_category(&store, user_id, category.id).await.unwrap_err();
        assert!(matches!(err, AppError::CategoryNotFound));
    }
}
