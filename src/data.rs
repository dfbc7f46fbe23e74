//! Data layer boundary
//!
//! Mutation targets for confirmed actions plus the financial summary
//! snapshot the context builder reads. The app's real schema/ORM is
//! external; this module only owns the call contract, an in-memory
//! store for development, and a thin Postgres backend.

use crate::error::OrchestratorError;
use crate::models::{
    BudgetPeriod, BudgetRecord, GoalRecord, PaymentFrequency, ScheduledPaymentRecord,
    TransactionDirection, TransactionRecord,
};
use crate::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use sqlx::{PgPool, Row};
use std::env;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Trait for the persisted-finance data layer
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn create_budget(
        &self,
        user_id: Uuid,
        name: &str,
        amount: f64,
        category: &str,
        period: BudgetPeriod,
    ) -> Result<BudgetRecord>;

    async fn create_goal(
        &self,
        user_id: Uuid,
        name: &str,
        target_amount: f64,
        deadline: Option<NaiveDate>,
    ) -> Result<GoalRecord>;

    async fn create_scheduled_payment(
        &self,
        user_id: Uuid,
        name: &str,
        amount: f64,
        category: &str,
        due_date: NaiveDate,
        frequency: PaymentFrequency,
    ) -> Result<ScheduledPaymentRecord>;

    async fn create_transaction(
        &self,
        user_id: Uuid,
        description: &str,
        amount: f64,
        category: &str,
        direction: TransactionDirection,
        date: Option<NaiveDate>,
    ) -> Result<TransactionRecord>;

    /// Financial summary snapshot used as chat context.
    async fn ai_context(&self, user_id: Uuid) -> Result<Value>;
}

//
// ================= In-Memory Store =================
//

/// In-memory data store for development & testing
pub struct InMemoryDataStore {
    budgets: Arc<RwLock<Vec<BudgetRecord>>>,
    goals: Arc<RwLock<Vec<GoalRecord>>>,
    payments: Arc<RwLock<Vec<ScheduledPaymentRecord>>>,
    transactions: Arc<RwLock<Vec<TransactionRecord>>>,
}

impl InMemoryDataStore {
    pub fn new() -> Self {
        Self {
            budgets: Arc::new(RwLock::new(Vec::new())),
            goals: Arc::new(RwLock::new(Vec::new())),
            payments: Arc::new(RwLock::new(Vec::new())),
            transactions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn budgets_for(&self, user_id: Uuid) -> Vec<BudgetRecord> {
        self.budgets
            .read()
            .await
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn goals_for(&self, user_id: Uuid) -> Vec<GoalRecord> {
        self.goals
            .read()
            .await
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn payments_for(&self, user_id: Uuid) -> Vec<ScheduledPaymentRecord> {
        self.payments
            .read()
            .await
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn transactions_for(&self, user_id: Uuid) -> Vec<TransactionRecord> {
        self.transactions
            .read()
            .await
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }
}

impl Default for InMemoryDataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataStore for InMemoryDataStore {
    async fn create_budget(
        &self,
        user_id: Uuid,
        name: &str,
        amount: f64,
        category: &str,
        period: BudgetPeriod,
    ) -> Result<BudgetRecord> {
        let record = BudgetRecord {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            amount,
            category: category.to_string(),
            period,
            created_at: Utc::now(),
        };

        self.budgets.write().await.push(record.clone());
        Ok(record)
    }

    async fn create_goal(
        &self,
        user_id: Uuid,
        name: &str,
        target_amount: f64,
        deadline: Option<NaiveDate>,
    ) -> Result<GoalRecord> {
        let record = GoalRecord {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            target_amount,
            deadline,
            created_at: Utc::now(),
        };

        self.goals.write().await.push(record.clone());
        Ok(record)
    }

    async fn create_scheduled_payment(
        &self,
        user_id: Uuid,
        name: &str,
        amount: f64,
        category: &str,
        due_date: NaiveDate,
        frequency: PaymentFrequency,
    ) -> Result<ScheduledPaymentRecord> {
        let record = ScheduledPaymentRecord {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            amount,
            category: category.to_string(),
            due_date,
            frequency,
            created_at: Utc::now(),
        };

        self.payments.write().await.push(record.clone());
        Ok(record)
    }

    async fn create_transaction(
        &self,
        user_id: Uuid,
        description: &str,
        amount: f64,
        category: &str,
        direction: TransactionDirection,
        date: Option<NaiveDate>,
    ) -> Result<TransactionRecord> {
        let record = TransactionRecord {
            id: Uuid::new_v4(),
            user_id,
            description: description.to_string(),
            amount,
            category: category.to_string(),
            direction,
            date: date.unwrap_or_else(|| Utc::now().date_naive()),
            created_at: Utc::now(),
        };

        self.transactions.write().await.push(record.clone());
        Ok(record)
    }

    async fn ai_context(&self, user_id: Uuid) -> Result<Value> {
        let budgets = self.budgets_for(user_id).await;
        let goals = self.goals_for(user_id).await;
        let payments = self.payments_for(user_id).await;
        let transactions = self.transactions_for(user_id).await;

        let spent: f64 = transactions
            .iter()
            .filter(|t| t.direction == TransactionDirection::Expense)
            .map(|t| t.amount)
            .sum();

        Ok(json!({
            "budget_count": budgets.len(),
            "budget_total": budgets.iter().map(|b| b.amount).sum::<f64>(),
            "goal_count": goals.len(),
            "goal_target_total": goals.iter().map(|g| g.target_amount).sum::<f64>(),
            "scheduled_payment_count": payments.len(),
            "transaction_count": transactions.len(),
            "total_spent": spent,
        }))
    }
}

//
// ================= Postgres Store =================
//

/// Postgres-backed data store.
/// Schema is bootstrapped lazily on first use.
pub struct PgDataStore {
    pool: PgPool,
    schema_ready: Arc<OnceCell<()>>,
}

impl PgDataStore {
    pub fn connect_lazy(url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(url)
            .map_err(|e| {
                OrchestratorError::DatabaseError(format!("Failed to create pool: {}", e))
            })?;

        Ok(Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        })
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS budgets (
                      id UUID PRIMARY KEY,
                      user_id UUID NOT NULL,
                      name TEXT NOT NULL,
                      amount DOUBLE PRECISION NOT NULL,
                      category TEXT NOT NULL,
                      period TEXT NOT NULL,
                      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS savings_goals (
                      id UUID PRIMARY KEY,
                      user_id UUID NOT NULL,
                      name TEXT NOT NULL,
                      target_amount DOUBLE PRECISION NOT NULL,
                      deadline DATE,
                      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS scheduled_payments (
                      id UUID PRIMARY KEY,
                      user_id UUID NOT NULL,
                      name TEXT NOT NULL,
                      amount DOUBLE PRECISION NOT NULL,
                      category TEXT NOT NULL,
                      due_date DATE NOT NULL,
                      frequency TEXT NOT NULL,
                      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS transactions (
                      id UUID PRIMARY KEY,
                      user_id UUID NOT NULL,
                      description TEXT NOT NULL,
                      amount DOUBLE PRECISION NOT NULL,
                      category TEXT NOT NULL,
                      direction TEXT NOT NULL,
                      date DATE NOT NULL,
                      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| {
                OrchestratorError::DatabaseError(format!(
                    "Failed to initialize data schema: {}",
                    e
                ))
            })?;

        Ok(())
    }
}

#[async_trait]
impl DataStore for PgDataStore {
    async fn create_budget(
        &self,
        user_id: Uuid,
        name: &str,
        amount: f64,
        category: &str,
        period: BudgetPeriod,
    ) -> Result<BudgetRecord> {
        self.ensure_schema().await?;

        let record = BudgetRecord {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            amount,
            category: category.to_string(),
            period,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO budgets (id, user_id, name, amount, category, period, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.name)
        .bind(record.amount)
        .bind(&record.category)
        .bind(record.period.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| OrchestratorError::DatabaseError(format!("Failed to insert budget: {}", e)))?;

        Ok(record)
    }

    async fn create_goal(
        &self,
        user_id: Uuid,
        name: &str,
        target_amount: f64,
        deadline: Option<NaiveDate>,
    ) -> Result<GoalRecord> {
        self.ensure_schema().await?;

        let record = GoalRecord {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            target_amount,
            deadline,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO savings_goals (id, user_id, name, target_amount, deadline, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.name)
        .bind(record.target_amount)
        .bind(record.deadline)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| OrchestratorError::DatabaseError(format!("Failed to insert goal: {}", e)))?;

        Ok(record)
    }

    async fn create_scheduled_payment(
        &self,
        user_id: Uuid,
        name: &str,
        amount: f64,
        category: &str,
        due_date: NaiveDate,
        frequency: PaymentFrequency,
    ) -> Result<ScheduledPaymentRecord> {
        self.ensure_schema().await?;

        let record = ScheduledPaymentRecord {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            amount,
            category: category.to_string(),
            due_date,
            frequency,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO scheduled_payments
              (id, user_id, name, amount, category, due_date, frequency, created_at)
            VALUES
              ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.name)
        .bind(record.amount)
        .bind(&record.category)
        .bind(record.due_date)
        .bind(record.frequency.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            OrchestratorError::DatabaseError(format!("Failed to insert scheduled payment: {}", e))
        })?;

        Ok(record)
    }

    async fn create_transaction(
        &self,
        user_id: Uuid,
        description: &str,
        amount: f64,
        category: &str,
        direction: TransactionDirection,
        date: Option<NaiveDate>,
    ) -> Result<TransactionRecord> {
        self.ensure_schema().await?;

        let record = TransactionRecord {
            id: Uuid::new_v4(),
            user_id,
            description: description.to_string(),
            amount,
            category: category.to_string(),
            direction,
            date: date.unwrap_or_else(|| Utc::now().date_naive()),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO transactions
              (id, user_id, description, amount, category, direction, date, created_at)
            VALUES
              ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.description)
        .bind(record.amount)
        .bind(&record.category)
        .bind(record.direction.as_str())
        .bind(record.date)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            OrchestratorError::DatabaseError(format!("Failed to insert transaction: {}", e))
        })?;

        Ok(record)
    }

    async fn ai_context(&self, user_id: Uuid) -> Result<Value> {
        self.ensure_schema().await?;

        let budgets = sqlx::query(
            "SELECT COUNT(*) AS n, COALESCE(SUM(amount), 0) AS total FROM budgets WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| OrchestratorError::DatabaseError(format!("Failed to load context: {}", e)))?;

        let goals = sqlx::query(
            "SELECT COUNT(*) AS n, COALESCE(SUM(target_amount), 0) AS total FROM savings_goals WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| OrchestratorError::DatabaseError(format!("Failed to load context: {}", e)))?;

        let spent = sqlx::query(
            "SELECT COALESCE(SUM(amount), 0) AS total FROM transactions WHERE user_id = $1 AND direction = 'expense'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| OrchestratorError::DatabaseError(format!("Failed to load context: {}", e)))?;

        Ok(json!({
            "budget_count": budgets.try_get::<i64, _>("n").unwrap_or(0),
            "budget_total": budgets.try_get::<f64, _>("total").unwrap_or(0.0),
            "goal_count": goals.try_get::<i64, _>("n").unwrap_or(0),
            "goal_target_total": goals.try_get::<f64, _>("total").unwrap_or(0.0),
            "total_spent": spent.try_get::<f64, _>("total").unwrap_or(0.0),
        }))
    }
}

//
// ================= Backend Selection =================
//

/// Pick the data backend from the environment: Postgres when a database
/// URL is configured and the pool can be created, in-memory otherwise.
pub fn data_store_from_env() -> Arc<dyn DataStore> {
    let database_url = env::var("POSTGRES_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .ok();

    if let Some(url) = database_url {
        match PgDataStore::connect_lazy(&url) {
            Ok(store) => {
                info!("Data store backend: postgres");
                return Arc::new(store);
            }
            Err(error) => {
                warn!(
                    "Failed to initialize postgres data store, falling back to in-memory: {}",
                    error
                );
            }
        }
    }

    info!("Data store backend: in-memory");
    Arc::new(InMemoryDataStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let store = InMemoryDataStore::new();
        let user_id = Uuid::new_v4();

        store
            .create_budget(user_id, "Food", 5000.0, "Food", BudgetPeriod::Monthly)
            .await
            .unwrap();

        let budgets = store.budgets_for(user_id).await;
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].amount, 5000.0);

        // A different user sees nothing.
        assert!(store.budgets_for(Uuid::new_v4()).await.is_empty());
    }

    #[tokio::test]
    async fn test_ai_context_summarizes() {
        let store = InMemoryDataStore::new();
        let user_id = Uuid::new_v4();

        store
            .create_budget(user_id, "Food", 5000.0, "Food", BudgetPeriod::Monthly)
            .await
            .unwrap();
        store
            .create_transaction(
                user_id,
                "Coffee",
                250.0,
                "Food",
                TransactionDirection::Expense,
                None,
            )
            .await
            .unwrap();

        let context = store.ai_context(user_id).await.unwrap();
        assert_eq!(context["budget_count"], 1);
        assert_eq!(context["total_spent"], 250.0);
    }
}
