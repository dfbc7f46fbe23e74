//! Action execution
//!
//! Second phase of the stage/confirm/execute protocol: on explicit user
//! confirmation, perform the real mutation against the data layer.
//! Idempotence lives in the session's action registry: by the time an
//! [`ActionParams`] reaches this module it has been consumed exactly once.

use crate::data::DataStore;
use crate::error::OrchestratorError;
use crate::models::{ActionParams, ExecutionResult};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Executes confirmed actions against the data layer
pub struct ActionExecutor {
    store: Arc<dyn DataStore>,
}

impl ActionExecutor {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, user_id: Uuid, params: &ActionParams) -> ExecutionResult {
        match self.dispatch(user_id, params).await {
            Ok(detail) => {
                info!(user_id = %user_id, action = %params.kind(), "Action executed");
                ExecutionResult {
                    success: true,
                    detail,
                }
            }
            Err(error) => {
                warn!(
                    user_id = %user_id,
                    action = %params.kind(),
                    "Action execution failed: {}",
                    error
                );
                ExecutionResult {
                    success: false,
                    detail: format!("Couldn't complete that — {}.", short_diagnostic(&error)),
                }
            }
        }
    }

    async fn dispatch(&self, user_id: Uuid, params: &ActionParams) -> crate::Result<String> {
        match params {
            ActionParams::CreateBudget {
                name,
                amount,
                category,
                period,
            } => {
                let record = self
                    .store
                    .create_budget(user_id, name, *amount, category, *period)
                    .await?;

                Ok(format!(
                    "Budget created: ₹{:.0} for {} ({}).",
                    record.amount, record.category, record.period
                ))
            }
            ActionParams::CreateSavingsGoal {
                name,
                target_amount,
                deadline,
            } => {
                let record = self
                    .store
                    .create_goal(user_id, name, *target_amount, *deadline)
                    .await?;

                let mut detail = format!(
                    "Savings goal \"{}\" created with a target of ₹{:.0}.",
                    record.name, record.target_amount
                );
                if let Some(deadline) = record.deadline {
                    detail.push_str(&format!(" Deadline: {}.", deadline));
                }
                Ok(detail)
            }
            ActionParams::CreateScheduledPayment {
                name,
                amount,
                category,
                due_date,
                frequency,
            } => {
                let record = self
                    .store
                    .create_scheduled_payment(
                        user_id, name, *amount, category, *due_date, *frequency,
                    )
                    .await?;

                Ok(format!(
                    "Scheduled {} payment of ₹{:.0} for {} ({}), next due {}.",
                    record.frequency, record.amount, record.name, record.category, record.due_date
                ))
            }
            ActionParams::AddTransaction {
                description,
                amount,
                category,
                direction,
                date,
            } => {
                let record = self
                    .store
                    .create_transaction(user_id, description, *amount, category, *direction, *date)
                    .await?;

                Ok(format!(
                    "Recorded {} of ₹{:.0} for {} ({}).",
                    record.direction, record.amount, record.description, record.category
                ))
            }
        }
    }
}

/// Short, safe suffix for failure text. Raw error detail stays in logs.
fn short_diagnostic(error: &OrchestratorError) -> &'static str {
    match error {
        OrchestratorError::DatabaseError(_) => "the data service rejected the request",
        OrchestratorError::Transport(_) | OrchestratorError::HttpError(_) => {
            "the data service couldn't be reached"
        }
        OrchestratorError::Configuration(_) => "the app isn't fully configured",
        _ => "an internal error occurred",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryDataStore;
    use crate::models::{BudgetPeriod, PaymentFrequency};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_budget_execution_summary() {
        let store = Arc::new(InMemoryDataStore::new());
        let executor = ActionExecutor::new(store.clone());
        let user_id = Uuid::new_v4();

        let result = executor
            .execute(
                user_id,
                &ActionParams::CreateBudget {
                    name: "Food".to_string(),
                    amount: 5000.0,
                    category: "Food".to_string(),
                    period: BudgetPeriod::Monthly,
                },
            )
            .await;

        assert!(result.success);
        assert!(result.detail.contains("5000"));
        assert!(result.detail.contains("Food"));
        assert!(result.detail.contains("monthly"));
        assert_eq!(store.budgets_for(user_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_payment_execution() {
        let store = Arc::new(InMemoryDataStore::new());
        let executor = ActionExecutor::new(store.clone());
        let user_id = Uuid::new_v4();

        let result = executor
            .execute(
                user_id,
                &ActionParams::CreateScheduledPayment {
                    name: "Netflix".to_string(),
                    amount: 499.0,
                    category: "Subscriptions".to_string(),
                    due_date: NaiveDate::from_ymd_opt(2026, 8, 14).unwrap(),
                    frequency: PaymentFrequency::Monthly,
                },
            )
            .await;

        assert!(result.success);
        assert!(result.detail.contains("Netflix"));
        assert_eq!(store.payments_for(user_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_text_is_sanitized() {
        use crate::models::*;
        use async_trait::async_trait;
        use serde_json::Value;

        struct DownStore;

        #[async_trait]
        impl DataStore for DownStore {
            async fn create_budget(
                &self,
                _: Uuid,
                _: &str,
                _: f64,
                _: &str,
                _: BudgetPeriod,
            ) -> crate::Result<BudgetRecord> {
                Err(OrchestratorError::DatabaseError(
                    "FATAL 57P01 terminating connection".into(),
                ))
            }

            async fn create_goal(
                &self,
                _: Uuid,
                _: &str,
                _: f64,
                _: Option<NaiveDate>,
            ) -> crate::Result<GoalRecord> {
                unreachable!()
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
                unreachable!()
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
                unreachable!()
            }

            async fn ai_context(&self, _: Uuid) -> crate::Result<Value> {
                unreachable!()
            }
        }

        let executor = ActionExecutor::new(Arc::new(DownStore));
        let result = executor
            .execute(
                Uuid::new_v4(),
                &ActionParams::CreateBudget {
                    name: "Food".to_string(),
                    amount: 5000.0,
                    category: "Food".to_string(),
                    period: BudgetPeriod::Monthly,
                },
            )
            .await;

        assert!(!result.success);
        assert!(!result.detail.contains("57P01"));
        assert!(result.detail.contains("data service"));
    }
}
