//! Transaction data models and API request/response types.
//!
//! This module defines:
//! - `Transaction`: stored income or expense record
//! - `TransactionType`: the two posting directions
//! - `TransactionRequest`: body for create and update
//! - `TransactionResponse`: response body, carrying the resolved category name
//! - `TransactionQuery` / `TransactionFilter`: list filtering

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::PaginationConfig,
    error::AppError,
    models::pagination::PageRequest,
};

/// Direction of a transaction. Wire and storage values are exactly
/// `"income"` and `"expense"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type '{other}'")),
        }
    }
}

/// A stored transaction.
///
/// `account_id` is optional: a transaction without an account only counts
/// towards summaries and never touches a balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,

    /// Always positive; the direction comes from `transaction_type`.
    pub amount: i64,
    pub transaction_type: TransactionType,
    pub category_id: Uuid,
    pub account_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub description: String,
}

impl Transaction {
    /// Balance delta this transaction contributes to its account:
    /// `+amount` for income, `-amount` for expense.
    pub fn signed_impact(&self) -> i64 {
        signed_impact(self.amount, self.transaction_type)
    }

    /// Overwrite every mutable field from an update request.
    pub fn apply_request(&mut self, request: TransactionRequest) {
        self.amount = request.amount;
        self.transaction_type = request.transaction_type;
        self.category_id = request.category_id;
        self.account_id = request.account_id;
        self.date = request.date;
        self.description = request.description;
    }
}

pub fn signed_impact(amount: i64, transaction_type: TransactionType) -> i64 {
    match transaction_type {
        TransactionType::Income => amount,
        TransactionType::Expense => -amount,
    }
}

/// Request body for creating or updating a transaction.
///
/// # JSON Example
///
/// ```json
/// {
///   "amount": 2500,
///   "transaction_type": "expense",
///   "category_id": "550e8400-e29b-41d4-a716-446655440000",
///   "account_id": "660e8400-e29b-41d4-a716-446655440001",
///   "date": "2025-12-21T16:00:00Z",
///   "description": "Weekly groceries"
/// }
/// ```
///
/// `date` accepts any RFC 3339 offset and is normalised to UTC.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRequest {
    pub amount: i64,
    pub transaction_type: TransactionType,
    pub category_id: Uuid,
    #[serde(default)]
    pub account_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
}

impl TransactionRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.amount <= 0 {
            return Err(AppError::InvalidRequest(
                "Amount must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn signed_impact(&self) -> i64 {
        signed_impact(self.amount, self.transaction_type)
    }

    pub fn into_transaction(self, user_id: Uuid) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            user_id,
            amount: self.amount,
            transaction_type: self.transaction_type,
            category_id: self.category_id,
            account_id: self.account_id,
            date: self.date,
            description: self.description,
        }
    }
}

/// Response returned for transaction operations.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub transaction_type: TransactionType,
    pub category_id: Uuid,
    pub category_name: String,
    pub account_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub description: String,
}

impl TransactionResponse {
    pub fn new(transaction: Transaction, category_name: String) -> Self {
        Self {
            id: transaction.id,
            user_id: transaction.user_id,
            amount: transaction.amount,
            transaction_type: transaction.transaction_type,
            category_id: transaction.category_id,
            category_name,
            account_id: transaction.account_id,
            date: transaction.date,
            description: transaction.description,
        }
    }
}

/// Query string accepted by `GET /api/v1/transactions`.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub category_name: Option<String>,
    pub transaction_type: Option<TransactionType>,
}

impl TransactionQuery {
    pub fn into_parts(
        self,
        pagination: PaginationConfig,
    ) -> Result<(TransactionFilter, PageRequest), AppError> {
        let page = PageRequest::resolve(self.page, self.page_size, pagination)?;
        let filter = TransactionFilter {
            start_date: self.start_date,
            end_date: self.end_date,
            category_name: self.category_name.filter(|name| !name.is_empty()),
            transaction_type: self.transaction_type,
        };
        Ok((filter, page))
    }
}

/// Store-level filter for transaction listings. Every field narrows the set.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Keep transactions dated at or after this instant.
    pub start_date: Option<DateTime<Utc>>,
    /// Keep transactions dated at or before this instant.
    pub end_date: Option<DateTime<Utc>>,
    pub category_name: Option<String>,
    pub transaction_type: Option<TransactionType>,
}

impl TransactionFilter {
    /// In-process predicate; the SQL store expresses the same conditions in its WHERE clause.
    pub fn matches(&self, transaction: &Transaction, category_name: Option<&str>) -> bool {
        if self.start_date.is_some_and(|start| transaction.date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| transaction.date > end) {
            return false;
        }
        if let Some(ty) = self.transaction_type {
            if transaction.transaction_type != ty {
                return false;
            }
        }
        if let Some(ref wanted) = self.category_name {
            if category_name != Some(wanted.as_str()) {
                return false;
            }
        }
        true
    }
}
