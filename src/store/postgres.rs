//! PostgreSQL store.
//!
//! A unit of work wraps one `sqlx` transaction. Enum columns are stored as
//! their wire names in TEXT columns guarded by CHECK constraints; a value
//! outside the known set surfaces as `AppError::Inconsistent`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder, Transaction as DbTransaction};
use uuid::Uuid;

use super::{Store, UnitOfWork};
use crate::{
    db::DbPool,
    error::AppError,
    models::{
        account::Account,
        category::Category,
        goal::{FinancialGoal, GoalFilter},
        pagination::PageRequest,
        transaction::{Transaction, TransactionFilter},
        user::User,
    },
};

/// Isolation for read-only units: every statement sees the snapshot taken
/// by the first one.
const SNAPSHOT_ISOLATION: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn begin_snapshot(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(SNAPSHOT_ISOLATION).execute(&mut *tx).await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn find_user_by_key_hash(&self, key_hash: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE key_hash = $1 AND is_active = TRUE",
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn register_user(&self, display_name: &str, key_hash: &str) -> Result<User, AppError> {
        let candidate = User::new(display_name.to_string(), key_hash.to_string());
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, key_hash, display_name, created_at, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            ON CONFLICT (key_hash)
            DO UPDATE SET display_name = EXCLUDED.display_name, is_active = TRUE
            RETURNING *
            "#,
        )
        .bind(candidate.id)
        .bind(&candidate.key_hash)
        .bind(&candidate.display_name)
        .bind(candidate.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub struct PgUnitOfWork {
    tx: DbTransaction<'static, Postgres>,
}

fn corrupt(column: &str, err: String) -> AppError {
    AppError::Inconsistent(format!("stored {column} is invalid: {err}"))
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    user_id: Uuid,
    account_name: String,
    account_type: String,
    current_balance: i64,
    initial_balance: i64,
    created_at: DateTime<Utc>,
    is_active: bool,
}

impl TryFrom<AccountRow> for Account {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: row.id,
            user_id: row.user_id,
            account_name: row.account_name,
            account_type: row
                .account_type
                .parse()
                .map_err(|e| corrupt("account_type", e))?,
            current_balance: row.current_balance,
            initial_balance: row.initial_balance,
            created_at: row.created_at,
            is_active: row.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: Uuid,
    amount: i64,
    transaction_type: String,
    category_id: Uuid,
    account_id: Option<Uuid>,
    date: DateTime<Utc>,
    description: String,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            id: row.id,
            user_id: row.user_id,
            amount: row.amount,
            transaction_type: row
                .transaction_type
                .parse()
                .map_err(|e| corrupt("transaction_type", e))?,
            category_id: row.category_id,
            account_id: row.account_id,
            date: row.date,
            description: row.description,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GoalRow {
    id: Uuid,
    user_id: Uuid,
    category_id: Uuid,
    goal_amount: i64,
    period: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<GoalRow> for FinancialGoal {
    type Error = AppError;

    fn try_from(row: GoalRow) -> Result<Self, Self::Error> {
        Ok(FinancialGoal {
            id: row.id,
            user_id: row.user_id,
            category_id: row.category_id,
            goal_amount: row.goal_amount,
            period: row.period.parse().map_err(|e| corrupt("period", e))?,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, AppError>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Append `WHERE` conditions for a transaction listing. Expects the query
/// to alias `transactions` as `t` and `categories` as `c`.
fn push_transaction_filter(
    builder: &mut QueryBuilder<'static, Postgres>,
    user_id: Uuid,
    filter: &TransactionFilter,
) {
    builder.push(" WHERE t.user_id = ").push_bind(user_id);
    if let Some(start) = filter.start_date {
        builder.push(" AND t.date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        builder.push(" AND t.date <= ").push_bind(end);
    }
    if let Some(ref name) = filter.category_name {
        builder.push(" AND c.name = ").push_bind(name.clone());
    }
    if let Some(ty) = filter.transaction_type {
        builder
            .push(" AND t.transaction_type = ")
            .push_bind(ty.as_str());
    }
}

/// Same as [`push_transaction_filter`] for goals aliased as `g`.
fn push_goal_filter(
    builder: &mut QueryBuilder<'static, Postgres>,
    user_id: Uuid,
    filter: &GoalFilter,
) {
    builder.push(" WHERE g.user_id = ").push_bind(user_id);
    if let Some(start) = filter.start_date {
        builder.push(" AND g.start_date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        builder.push(" AND g.end_date <= ").push_bind(end);
    }
    if let Some(ref name) = filter.category_name {
        builder.push(" AND c.name = ").push_bind(name.clone());
    }
    if let Some(period) = filter.period {
        builder.push(" AND g.period = ").push_bind(period.as_str());
    }
    if let Some(amount) = filter.goal_amount {
        builder.push(" AND g.goal_amount = ").push_bind(amount);
    }
}

fn push_page(builder: &mut QueryBuilder<'static, Postgres>, page: PageRequest) {
    // Both fit in i64: page and page_size are u32.
    builder
        .push(" LIMIT ")
        .push_bind(page.limit() as i64)
        .push(" OFFSET ")
        .push_bind(page.offset() as i64);
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn insert_account(&mut self, account: &Account) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, user_id, account_name, account_type,
                current_balance, initial_balance, created_at, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(account.id)
        .bind(account.user_id)
        .bind(&account.account_name)
        .bind(account.account_type.as_str())
        .bind(account.current_balance)
        .bind(account.initial_balance)
        .bind(account.created_at)
        .bind(account.is_active)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn find_account(
        &mut self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Account>, AppError> {
        // FOR UPDATE holds the row until commit, serialising balance changes.
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn list_accounts(&mut self, user_id: Uuid) -> Result<Vec<Account>, AppError> {
        let rows = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE user_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET account_name = $1,
                account_type = $2,
                current_balance = $3,
                is_active = $4
            WHERE id = $5 AND user_id = $6
            "#,
        )
        .bind(&account.account_name)
        .bind(account.account_type.as_str())
        .bind(account.current_balance)
        .bind(account.is_active)
        .bind(account.id)
        .bind(account.user_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_account(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM accounts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn account_in_use(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM transactions WHERE account_id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(in_use)
    }

    async fn insert_category(&mut self, category: &Category) -> Result<(), AppError> {
        sqlx::query("INSERT INTO categories (id, user_id, name) VALUES ($1, $2, $3)")
            .bind(category.id)
            .bind(category.user_id)
            .bind(&category.name)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn find_category(
        &mut self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Category>, AppError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT * FROM categories WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Category::from))
    }

    async fn list_categories(&mut self, user_id: Uuid) -> Result<Vec<Category>, AppError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT * FROM categories WHERE user_id = $1 ORDER BY name, id",
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn save_category(&mut self, category: &Category) -> Result<(), AppError> {
        sqlx::query("UPDATE categories SET name = $1 WHERE id = $2 AND user_id = $3")
            .bind(&category.name)
            .bind(category.id)
            .bind(category.user_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn delete_category(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn category_in_use(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let in_use: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM transactions WHERE category_id = $1 AND user_id = $2)
                OR EXISTS(SELECT 1 FROM financial_goals WHERE category_id = $1 AND user_id = $2)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(in_use)
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, user_id, amount, transaction_type,
                category_id, account_id, date, description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.user_id)
        .bind(transaction.amount)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.category_id)
        .bind(transaction.account_id)
        .bind(transaction.date)
        .bind(&transaction.description)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn find_transaction(
        &mut self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Transaction>, AppError> {
        let row = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Transaction::try_from).transpose()
    }

    async fn save_transaction(&mut self, transaction: &Transaction) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE transactions
            SET amount = $1,
                transaction_type = $2,
                category_id = $3,
                account_id = $4,
                date = $5,
                description = $6
            WHERE id = $7 AND user_id = $8
            "#,
        )
        .bind(transaction.amount)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.category_id)
        .bind(transaction.account_id)
        .bind(transaction.date)
        .bind(&transaction.description)
        .bind(transaction.id)
        .bind(transaction.user_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_transaction(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn list_transactions(&mut self, user_id: Uuid) -> Result<Vec<Transaction>, AppError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE user_id = $1 ORDER BY date, id",
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    async fn query_transactions(
        &mut self,
        user_id: Uuid,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<Transaction>, u64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM transactions t JOIN categories c ON c.id = t.category_id",
        );
        push_transaction_filter(&mut count, user_id, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&mut *self.tx)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(
            "SELECT t.* FROM transactions t JOIN categories c ON c.id = t.category_id",
        );
        push_transaction_filter(&mut select, user_id, filter);
        select.push(" ORDER BY t.date, t.id");
        push_page(&mut select, page);
        let rows: Vec<TransactionRow> = select
            .build_query_as()
            .fetch_all(&mut *self.tx)
            .await?;

        Ok((convert_all(rows)?, total.max(0) as u64))
    }

    async fn insert_goal(&mut self, goal: &FinancialGoal) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO financial_goals (
                id, user_id, category_id, goal_amount,
                period, start_date, end_date, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(goal.id)
        .bind(goal.user_id)
        .bind(goal.category_id)
        .bind(goal.goal_amount)
        .bind(goal.period.as_str())
        .bind(goal.start_date)
        .bind(goal.end_date)
        .bind(goal.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn find_goal(
        &mut self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<FinancialGoal>, AppError> {
        let row = sqlx::query_as::<_, GoalRow>(
            "SELECT * FROM financial_goals WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(FinancialGoal::try_from).transpose()
    }

    async fn save_goal(&mut self, goal: &FinancialGoal) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE financial_goals
            SET category_id = $1,
                goal_amount = $2,
                period = $3,
                start_date = $4,
                end_date = $5
            WHERE id = $6 AND user_id = $7
            "#,
        )
        .bind(goal.category_id)
        .bind(goal.goal_amount)
        .bind(goal.period.as_str())
        .bind(goal.start_date)
        .bind(goal.end_date)
        .bind(goal.id)
        .bind(goal.user_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_goal(&mut self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM financial_goals WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn query_goals(
        &mut self,
        user_id: Uuid,
        filter: &GoalFilter,
        page: PageRequest,
    ) -> Result<(Vec<FinancialGoal>, u64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM financial_goals g JOIN categories c ON c.id = g.category_id",
        );
        push_goal_filter(&mut count, user_id, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&mut *self.tx)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(
            "SELECT g.* FROM financial_goals g JOIN categories c ON c.id = g.category_id",
        );
        push_goal_filter(&mut select, user_id, filter);
        select.push(" ORDER BY g.start_date, g.id");
        push_page(&mut select, page);
        let rows: Vec<GoalRow> = select
            .build_query_as()
            .fetch_all(&mut *self.tx)
            .await?;

        Ok((convert_all(rows)?, total.max(0) as u64))
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_units_are_repeatable_read_and_read_only() {
        assert!(SNAPSHOT_ISOLATION.starts_with("SET TRANSACTION"));
        assert!(SNAPSHOT_ISOLATION.contains("REPEATABLE READ"));
        assert!(SNAPSHOT_ISOLATION.ends_with("READ ONLY"));
    }
}
