//! Financial goal HTTP handlers.
//!
//! - POST /api/v1/goals
//! - GET /api/v1/goals?page=&page_size=&start_date=&end_date=&category_name=&period=&goal_amount=
//! - GET / PUT / DELETE /api/v1/goals/{id}

use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        goal::{GoalQuery, GoalRequest, GoalResponse},
        pagination::PaginatedList,
    },
    services::goal_service,
};

pub async fn create_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<GoalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GoalResponse>), AppError> {
    let Json(request) = payload?;
    let goal = goal_service::create_goal(state.store.as_ref(), auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(goal.into())))
}

/// Goals whose whole period lies inside `[start_date, end_date]` when both
/// bounds are given. A non-positive `goal_amount` is ignored.
pub async fn list_goals(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<GoalQuery>, QueryRejection>,
) -> Result<Json<PaginatedList<GoalResponse>>, AppError> {
    let Query(query) = query?;
    let (filter, page) = query.into_parts(state.pagination)?;
    let list = goal_service::list_goals(state.store.as_ref(), auth.user_id, filter, page).await?;
    Ok(Json(list.map(GoalResponse::from)))
}

pub async fn get_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalResponse>, AppError> {
    let goal = goal_service::get_goal(state.store.as_ref(), auth.user_id, goal_id).await?;
    Ok(Json(goal.into()))
}

pub async fn update_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
    payload: Result<Json<GoalRequest>, JsonRejection>,
) -> Result<Json<GoalResponse>, AppError> {
    let Json(request) = payload?;
    let goal =
        goal_service::update_goal(state.store.as_ref(), auth.user_id, goal_id, request).await?;
    Ok(Json(goal.into()))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    goal_service::delete_goal(state.store.as_ref(), auth.user_id, goal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
