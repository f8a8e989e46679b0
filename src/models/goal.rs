//! Financial goal models.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::PaginationConfig, error::AppError, models::pagination::PageRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl GoalPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalPeriod::Daily => "daily",
            GoalPeriod::Weekly => "weekly",
            GoalPeriod::Monthly => "monthly",
            GoalPeriod::Yearly => "yearly",
        }
    }
}

impl fmt::Display for GoalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(GoalPeriod::Daily),
            "weekly" => Ok(GoalPeriod::Weekly),
            "monthly" => Ok(GoalPeriod::Monthly),
            "yearly" => Ok(GoalPeriod::Yearly),
            other => Err(format!("unknown goal period '{other}'")),
        }
    }
}

/// A spending or saving target for one category over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinancialGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub goal_amount: i64,
    pub period: GoalPeriod,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl FinancialGoal {
    pub fn apply_request(&mut self, request: GoalRequest) {
        self.category_id = request.category_id;
        self.goal_amount = request.goal_amount;
        self.period = request.period;
        self.start_date = request.start_date;
        self.end_date = request.end_date;
    }
}

/// Request body for creating or replacing a goal.
///
/// ```json
/// {
///   "category_id": "550e8400-e29b-41d4-a716-446655440000",
///   "goal_amount": 40000,
///   "period": "monthly",
///   "start_date": "2025-01-01T00:00:00Z",
///   "end_date": "2025-12-31T23:59:59Z"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct GoalRequest {
    pub category_id: Uuid,
    pub goal_amount: i64,
    pub period: GoalPeriod,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl GoalRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.goal_amount <= 0 {
            return Err(AppError::InvalidRequest(
                "Goal amount must be greater than zero".to_string(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(AppError::InvalidRequest(
                "End date must not precede start date".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_goal(self, user_id: Uuid) -> FinancialGoal {
        FinancialGoal {
            id: Uuid::new_v4(),
            user_id,
            category_id: self.category_id,
            goal_amount: self.goal_amount,
            period: self.period,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GoalResponse {
    pub id: Uuid,
    pub category_id: Uuid,
    pub goal_amount: i64,
    pub period: GoalPeriod,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<FinancialGoal> for GoalResponse {
    fn from(goal: FinancialGoal) -> Self {
        Self {
            id: goal.id,
            category_id: goal.category_id,
            goal_amount: goal.goal_amount,
            period: goal.period,
            start_date: goal.start_date,
            end_date: goal.end_date,
            created_at: goal.created_at,
        }
    }
}

/// Query string accepted by `GET /api/v1/goals`.
#[derive(Debug, Default, Deserialize)]
pub struct GoalQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub category_name: Option<String>,
    pub period: Option<GoalPeriod>,
    pub goal_amount: Option<i64>,
}

impl GoalQuery {
    pub fn into_parts(
        self,
        pagination: PaginationConfig,
    ) -> Result<(GoalFilter, PageRequest), AppError> {
        let page = PageRequest::resolve(self.page, self.page_size, pagination)?;
        let filter = GoalFilter {
            start_date: self.start_date,
            end_date: self.end_date,
            category_name: self.category_name.filter(|name| !name.is_empty()),
            period: self.period,
            // Non-positive amounts never match a goal, so treat them as "no filter".
            goal_amount: self.goal_amount.filter(|amount| *amount > 0),
        };
        Ok((filter, page))
    }
}

#[derive(Debug, Clone, Default)]
pub struct GoalFilter {
    /// Keep goals starting at or after this instant.
    pub start_date: Option<DateTime<Utc>>,
    /// Keep goals ending at or before this instant.
    pub end_date: Option<DateTime<Utc>>,
    pub category_name: Option<String>,
    pub period: Option<GoalPeriod>,
    pub goal_amount: Option<i64>,
}

impl GoalFilter {
    pub fn matches(&self, goal: &FinancialGoal, category_name: Option<&str>) -> bool {
        if self.start_date.is_some_and(|start| goal.start_date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| goal.end_date > end) {
            return false;
        }
        if self.period.is_some_and(|period| goal.period != period) {
            return false;
        }
        if self.goal_amount.is_some_and(|amount| goal.goal_amount != amount) {
            return false;
        }
        if let Some(ref wanted) = self.category_name {
            if category_name != Some(wanted.as_str()) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> GoalRequest {
        GoalRequest {
            category_id: Uuid::new_v4(),
            goal_amount: 500,
            period: GoalPeriod::Monthly,
            start_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let mut req = request();
        std::mem::swap(&mut req.start_date, &mut req.end_date);
        assert!(matches!(req.validate(), Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn zero_goal_amount_is_rejected() {
        let mut req = request();
        req.goal_amount = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn period_names_are_closed() {
        assert_eq!("weekly".parse::<GoalPeriod>().unwrap(), GoalPeriod::Weekly);
        assert!("semanal".parse::<GoalPeriod>().is_err());
    }

    #[test]
    fn filter_checks_period_and_amount() {
        let goal = request().into_goal(Uuid::new_v4());
        let filter = GoalFilter {
            period: Some(GoalPeriod::Monthly),
            goal_amount: Some(500),
            ..Default::default()
        };
        assert!(filter.matches(&goal, None));

        let filter = GoalFilter {
            goal_amount: Some(501),
            ..Default::default()
        };
        assert!(!filter.matches(&goal, None));
    }
}
