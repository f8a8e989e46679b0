//! Account data models and API request/response types.
//!
//! This module defines:
//! - `Account`: stored account with its running balance
//! - `AccountType`: closed set of account kinds
//! - `CreateAccountRequest` / `UpdateAccountRequest`: request bodies
//! - `AccountResponse`: response body returned to clients

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Maximum length of an account display name, in characters.
pub const MAX_ACCOUNT_NAME_LEN: usize = 100;

/// Kind of account. Stored as its snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    Savings,
    CreditCard,
    Cash,
    Investment,
    Loan,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::CreditCard => "credit_card",
            AccountType::Cash => "cash",
            AccountType::Investment => "investment",
            AccountType::Loan => "loan",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checking" => Ok(AccountType::Checking),
            "savings" => Ok(AccountType::Savings),
            "credit_card" => Ok(AccountType::CreditCard),
            "cash" => Ok(AccountType::Cash),
            "investment" => Ok(AccountType::Investment),
            "loan" => Ok(AccountType::Loan),
            other => Err(format!("unknown account type '{other}'")),
        }
    }
}

/// An account owned by one user.
///
/// # Balance Storage
///
/// Balances are `i64` minor units (cents) to avoid floating-point errors.
/// `current_balance` always equals `initial_balance` plus the signed amounts
/// of every transaction posted against the account. Only the ledger in
/// `services::transaction_service` moves it after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: Uuid,

    /// Owning user. Every lookup filters on it.
    pub user_id: Uuid,

    pub account_name: String,
    pub account_type: AccountType,
    pub current_balance: i64,
    pub initial_balance: i64,
    pub created_at: DateTime<Utc>,

    /// Archived accounts keep their history but accept no new postings.
    pub is_active: bool,
}

impl Account {
    /// Build a fresh active account whose balance starts at `initial_balance`.
    pub fn new(
        user_id: Uuid,
        account_name: String,
        account_type: AccountType,
        initial_balance: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            account_name,
            account_type,
            current_balance: initial_balance,
            initial_balance,
            created_at: Utc::now(),
            is_active: true,
        }
    }
}

/// Request body for creating a new account.
///
/// # JSON Example
///
/// ```json
/// {
///   "account_name": "Main checking",
///   "account_type": "checking",
///   "initial_balance": 100000
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub account_name: String,
    pub account_type: AccountType,

    /// Opening balance in minor units (defaults to 0). May be negative for
    /// loans and credit cards.
    #[serde(default)]
    pub initial_balance: i64,
}

impl CreateAccountRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_account_name(&self.account_name)
    }
}

/// Request body for editing an account.
///
/// The balance is not editable here; it only moves through transactions.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub account_name: String,
    pub account_type: AccountType,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl UpdateAccountRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_account_name(&self.account_name)
    }
}

fn validate_account_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidRequest(
            "Account name is required".to_string(),
        ));
    }
    if name.chars().count() > MAX_ACCOUNT_NAME_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Account name can't be longer than {MAX_ACCOUNT_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Response body for account endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "account_name": "Main checking",
///   "account_type": "checking",
///   "current_balance": 120000,
///   "initial_balance": 100000,
///   "created_at": "2025-12-20T10:00:00Z",
///   "is_active": true
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub account_name: String,
    pub account_type: AccountType,
    pub current_balance: i64,
    pub initial_balance: i64,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Removes the internal `user_id` field.
impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            account_name: account.account_name,
            account_type: account.account_type,
            current_balance: account.current_balance,
            initial_balance: account.initial_balance,
            created_at: account.created_at,
            is_active: account.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_starts_at_initial_balance() {
        let account = Account::new(Uuid::new_v4(), "Wallet".into(), AccountType::Cash, 1000);
        assert_eq!(account.current_balance, 1000);
        assert_eq!(account.initial_balance, 1000);
        assert!(account.is_active);
    }

    #[test]
    fn account_type_round_trips_through_its_stored_name() {
        for ty in [
            AccountType::Checking,
            AccountType::Savings,
            AccountType::CreditCard,
            AccountType::Cash,
            AccountType::Investment,
            AccountType::Loan,
        ] {
            assert_eq!(ty.as_str().parse::<AccountType>().unwrap(), ty);
        }
        assert!("CreditCard".parse::<AccountType>().is_err());
    }

    #[test]
    fn blank_and_overlong_names_are_rejected() {
        let blank = CreateAccountRequest {
            account_name: "   ".into(),
            account_type: AccountType::Cash,
            initial_balance: 0,
        };
        assert!(matches!(blank.validate(), Err(AppError::InvalidRequest(_))));

        let long = CreateAccountRequest {
            account_name: "x".repeat(MAX_ACCOUNT_NAME_LEN + 1),
            account_type: AccountType::Cash,
            initial_balance: 0,
        };
        assert!(matches!(long.validate(), Err(AppError::InvalidRequest(_))));
    }
}
