//! Income/expense summary returned by `GET /api/v1/transactions/summary`.

use std::collections::BTreeMap;

use serde::Serialize;

/// Totals derived from all of a user's transactions. Never persisted.
///
/// `balance == total_income - total_expenses`, and the values of each
/// per-category map sum to the matching total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_income: i64,
    pub total_expenses: i64,
    pub balance: i64,
    pub expenses_by_category: BTreeMap<String, i64>,
    pub income_by_category: BTreeMap<String, i64>,
}
