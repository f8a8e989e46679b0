//! Category HTTP handlers.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::category::{CategoryRequest, CategoryResponse},
    services::category_service,
};

/// `POST /api/v1/categories` with `{"name": "Groceries"}`. Returns 201.
pub async fn create_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    let Json(request) = payload?;
    let category =
        category_service::create_category(state.store.as_ref(), auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

pub async fn get_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(category_id): Path<Uuid>,
) -> Result<Json<CategoryResponse>, AppError> {
    let category =
        category_service::get_category(state.store.as_ref(), auth.user_id, category_id).await?;
    Ok(Json(category.into()))
}

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = category_service::list_categories(state.store.as_ref(), auth.user_id).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

pub async fn rename_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(category_id): Path<Uuid>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<Json<CategoryResponse>, AppError> {
    let Json(request) = payload?;
    let category =
        category_service::rename_category(state.store.as_ref(), auth.user_id, category_id, request)
            .await?;
    Ok(Json(category.into()))
}

/// 204 on success, 409 while transactions or goals still use the category.
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    category_service::delete_category(state.store.as_ref(), auth.user_id, category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
