//! Router assembly.
//!
//! Kept separate from `main` so integration tests can drive the exact
//! router the server runs, backed by whatever store they choose.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{config::PaginationConfig, handlers, middleware, store::SharedStore};

/// State shared with every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub pagination: PaginationConfig,
}

impl AppState {
    pub fn new(store: SharedStore, pagination: PaginationConfig) -> Self {
        Self { store, pagination }
    }
}

/// Build the full application router.
///
/// # Routes
///
/// - `GET /health` (public)
/// - `/api/v1/accounts`, `/api/v1/categories`, `/api/v1/transactions`,
///   `/api/v1/goals` and their `/{id}` forms (API key required)
/// - `GET /api/v1/transactions/summary` (API key required)
pub fn build_router(state: AppState) -> Router {
    let authenticated_routes = Router::new()
        // Accounts
        .route(
            "/api/v1/accounts",
            post(handlers::accounts::create_account).get(handlers::accounts::list_accounts),
        )
        .route(
            "/api/v1/accounts/{id}",
            get(handlers::accounts::get_account)
                .put(handlers::accounts::update_account)
                .delete(handlers::accounts::delete_account),
        )
        // Categories
        .route(
            "/api/v1/categories",
            post(handlers::categories::create_category)
                .get(handlers::categories::list_categories),
        )
        .route(
            "/api/v1/categories/{id}",
            get(handlers::categories::get_category)
                .put(handlers::categories::rename_category)
                .delete(handlers::categories::delete_category),
        )
        // Transactions
        .route(
            "/api/v1/transactions",
            post(handlers::transactions::create_transaction)
                .get(handlers::transactions::list_transactions),
        )
        .route(
            "/api/v1/transactions/summary",
            get(handlers::transactions::get_summary),
        )
        .route(
            "/api/v1/transactions/{id}",
            get(handlers::transactions::get_transaction)
                .put(handlers::transactions::update_transaction)
                .delete(handlers::transactions::delete_transaction),
        )
        // Goals
        .route(
            "/api/v1/goals",
            post(handlers::goals::create_goal).get(handlers::goals::list_goals),
        )
        .route(
            "/api/v1/goals/{id}",
            get(handlers::goals::get_goal)
                .put(handlers::goals::update_goal)
                .delete(handlers::goals::delete_goal),
        )
        // Every route above requires a valid API key
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(authenticated_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
