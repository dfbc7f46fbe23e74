//! Chat context assembly
//!
//! Every conversational turn gets a snapshot of the user's financial
//! state plus temporal metadata (today's date, weekday, how much of the
//! month is left, the numbers a budgeting answer actually needs).
//! A failed snapshot fetch degrades to a minimal "context unavailable"
//! marker; the chat call still proceeds.

use crate::data::DataStore;
use crate::slots::date::days_in_month;
use chrono::{DateTime, Datelike, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Snapshot handed to the chat layer.
#[derive(Debug, Clone)]
pub struct UserContext {
    /// False when the data layer could not be reached.
    pub available: bool,
    pub summary: Option<Value>,
    pub date: String,
    pub time: String,
    pub weekday: String,
    pub day_of_month: u32,
    pub days_left_in_month: u32,
}

impl UserContext {
    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "available": self.available,
            "date": self.date,
            "time": self.time,
            "weekday": self.weekday,
            "day_of_month": self.day_of_month,
            "days_left_in_month": self.days_left_in_month,
        });

        if let Some(summary) = &self.summary {
            value["summary"] = summary.clone();
        }

        value
    }
}

/// Builds per-turn chat context from the data layer
pub struct ContextBuilder {
    store: Arc<dyn DataStore>,
}

impl ContextBuilder {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn build(&self, user_id: Uuid) -> UserContext {
        self.build_at(user_id, Utc::now()).await
    }

    /// Like [`build`](Self::build) with an injected clock.
    pub async fn build_at(&self, user_id: Uuid, now: DateTime<Utc>) -> UserContext {
        let date = now.date_naive();
        let total_days = days_in_month(date.year(), date.month());

        let mut context = UserContext {
            available: false,
            summary: None,
            date: date.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M").to_string(),
            weekday: now.format("%A").to_string(),
            day_of_month: date.day(),
            days_left_in_month: total_days.saturating_sub(date.day()),
        };

        match self.store.ai_context(user_id).await {
            Ok(summary) => {
                context.available = true;
                context.summary = Some(summary);
            }
            Err(error) => {
                warn!(
                    user_id = %user_id,
                    "Context fetch failed, continuing with minimal context: {}",
                    error
                );
            }
        }

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryDataStore;
    use crate::error::OrchestratorError;
    use crate::models::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct FailingStore;

    #[async_trait]
    impl DataStore for FailingStore {
        async fn create_budget(
            &self,
            _: Uuid,
            _: &str,
            _: f64,
            _: &str,
            _: BudgetPeriod,
        ) -> crate::Result<BudgetRecord> {
            Err(OrchestratorError::DatabaseError("down".into()))
        }

        async fn create_goal(
            &self,
            _: Uuid,
            _: &str,
            _: f64,
            _: Option<NaiveDate>,
        ) -> crate::Result<GoalRecord> {
            Err(OrchestratorError::DatabaseError("down".into()))
        }

        async fn create_scheduled_payment(
            &self,
            _: Uuid,
            _: &str,
            _: f64,
            _: &str,
            _: NaiveDate,
            _: PaymentFrequency,
        ) -> crate::Result<ScheduledPaymentRecord> {
            Err(OrchestratorError::DatabaseError("down".into()))
        }

        async fn create_transaction(
            &self,
            _: Uuid,
            _: &str,
            _: f64,
            _: &str,
            _: TransactionDirection,
            _: Option<NaiveDate>,
        ) -> crate::Result<TransactionRecord> {
            Err(OrchestratorError::DatabaseError("down".into()))
        }

        async fn ai_context(&self, _: Uuid) -> crate::Result<serde_json::Value> {
            Err(OrchestratorError::DatabaseError("down".into()))
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        // Friday, 2026-08-07 10:30 UTC
        NaiveDate::from_ymd_opt(2026, 8, 7)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
            .and_utc()
    }

    #[tokio::test]
    async fn test_temporal_fields() {
        let builder = ContextBuilder::new(Arc::new(InMemoryDataStore::new()));
        let context = builder.build_at(Uuid::new_v4(), fixed_now()).await;

        assert!(context.available);
        assert_eq!(context.date, "2026-08-07");
        assert_eq!(context.weekday, "Friday");
        assert_eq!(context.day_of_month, 7);
        // August has 31 days.
        assert_eq!(context.days_left_in_month, 24);
    }

    #[tokio::test]
    async fn test_fetch_failure_degrades_to_minimal_context() {
        let builder = ContextBuilder::new(Arc::new(FailingStore));
        let context = builder.build_at(Uuid::new_v4(), fixed_now()).await;

        assert!(!context.available);
        assert!(context.summary.is_none());
        // Temporal fields still present so the turn can proceed.
        assert_eq!(context.date, "2026-08-07");
        assert_eq!(context.to_value()["available"], false);
    }
}
