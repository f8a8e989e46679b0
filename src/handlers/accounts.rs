//! Account management HTTP handlers.
//!
//! This module implements the account-related API endpoints:
//! - POST /api/v1/accounts - Create new account
//! - GET /api/v1/accounts - List the caller's accounts, newest first
//! - GET /api/v1/accounts/{id} - Get account by ID
//! - PUT /api/v1/accounts/{id} - Rename, retype or archive
//! - DELETE /api/v1/accounts/{id} - Delete an account no transaction uses

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
    models::account::{AccountResponse, CreateAccountRequest, UpdateAccountRequest},
    services::account_service,
};

/// Create a new account.
///
/// # Request Body
///
/// ```json
/// {
///   "account_name": "Main checking",
///   "account_type": "checking",
///   "initial_balance": 100000
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: the created account; `current_balance`
///   equals `initial_balance`
/// - **Error (400)**: blank name or unknown `account_type`
/// - **Error (401)**: Invalid API key
pub async fn create_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let Json(request) = payload?;
    let account =
        account_service::create_account(state.store.as_ref(), auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Get a specific account by ID.
///
/// Returns 404 if the account doesn't exist OR belongs to a different user,
/// so the existence of other users' accounts is never leaked.
pub async fn get_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountResponse>, AppError> {
    let account =
        account_service::get_account(state.store.as_ref(), auth.user_id, account_id).await?;
    Ok(Json(account.into()))
}

pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let accounts = account_service::list_accounts(state.store.as_ref(), auth.user_id).await?;
    let responses: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();
    Ok(Json(responses))
}

/// Update name, type and active flag. The balance is not editable.
pub async fn update_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(account_id): Path<Uuid>,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Result<Json<AccountResponse>, AppError> {
    let Json(request) = payload?;
    let account =
        account_service::update_account(state.store.as_ref(), auth.user_id, account_id, request)
            .await?;
    Ok(Json(account.into()))
}

/// # Response
///
/// - **Success (204 No Content)**
/// - **Error (404)**: account not found
/// - **Error (409)**: transactions still reference the account
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(account_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    account_service::delete_account(state.store.as_ref(), auth.user_id, account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
