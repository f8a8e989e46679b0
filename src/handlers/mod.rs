//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, query string)
//! 2. Calls the matching service with the authenticated user's id
//! 3. Returns HTTP response (JSON, status code)
//!
//! Body and query extraction failures are turned into `AppError::InvalidRequest`
//! so every client error shares the same JSON error shape.

/// Account management endpoints
pub mod accounts;
/// Category endpoints
pub mod categories;
/// Financial goal endpoints
pub mod goals;
/// Liveness probe
pub mod health;
/// Transaction and summary endpoints
pub mod transactions;
