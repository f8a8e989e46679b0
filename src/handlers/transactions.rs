//! Transaction HTTP handlers.
//!
//! This module implements transaction-related API endpoints:
//! - POST /api/v1/transactions - Record income or expense
//! - GET /api/v1/transactions - Filtered, paginated listing
//! - GET /api/v1/transactions/summary - Totals and per-category breakdowns
//! - GET /api/v1/transactions/{id} - Get transaction details
//! - PUT /api/v1/transactions/{id} - Replace a transaction
//! - DELETE /api/v1/transactions/{id} - Delete and reverse its balance impact

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
        pagination::PaginatedList,
        summary::Summary,
        transaction::{TransactionQuery, TransactionRequest, TransactionResponse},
    },
    services::{summary_service, transaction_service},
};

/// Record a transaction.
///
/// # Request Body
///
/// ```json
/// {
///   "amount": 2500,
///   "transaction_type": "expense",
///   "category_id": "550e8400-...",
///   "account_id": "660e8400-...",
///   "date": "2025-12-21T16:00:00Z",
///   "description": "Weekly groceries"
/// }
/// ```
///
/// `account_id` and `description` are optional. When an account is given
/// its balance moves by `+amount` (income) or `-amount` (expense) in the
/// same atomic operation.
///
/// # Response
///
/// - **201 Created**: the transaction with its category name
/// - **400**: non-positive amount, unknown type, malformed body, archived account
/// - **404**: category or account not found
pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let Json(request) = payload?;
    let transaction =
        transaction_service::create_transaction(state.store.as_ref(), auth.user_id, request)
            .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// List transactions.
///
/// # Query Parameters
///
/// - `page` (default 1), `page_size` (default and maximum from config)
/// - `start_date`, `end_date`: RFC 3339, inclusive bounds on `date`
/// - `category_name`: exact match
/// - `transaction_type`: `income` or `expense`
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<Json<PaginatedList<TransactionResponse>>, AppError> {
    let Query(query) = query?;
    let (filter, page) = query.into_parts(state.pagination)?;
    let list =
        transaction_service::list_transactions(state.store.as_ref(), auth.user_id, filter, page)
            .await?;
    Ok(Json(list))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction =
        transaction_service::get_transaction(state.store.as_ref(), auth.user_id, transaction_id)
            .await?;
    Ok(Json(transaction))
}

/// Replace every field of a transaction. Same body as create.
pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(transaction_id): Path<Uuid>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, AppError> {
    let Json(request) = payload?;
    let transaction = transaction_service::update_transaction(
        state.store.as_ref(),
        auth.user_id,
        transaction_id,
        request,
    )
    .await?;
    Ok(Json(transaction))
}

/// 204 when deleted, 404 when there was nothing to delete.
pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(transaction_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted =
        transaction_service::delete_transaction(state.store.as_ref(), auth.user_id, transaction_id)
            .await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::TransactionNotFound)
    }
}

/// # Response (200)
///
/// ```json
/// {
///   "total_income": 300000,
///   "total_expenses": 120000,
///   "balance": 180000,
///   "expenses_by_category": { "Food": 20000, "Rent": 100000 },
///   "income_by_category": { "Salary": 300000 }
/// }
/// ```
pub async fn get_summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Summary>, AppError> {
    let summary = summary_service::get_summary(state.store.as_ref(), auth.user_id).await?;
    Ok(Json(summary))
}
