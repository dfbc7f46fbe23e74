//! Action staging
//!
//! First phase of the stage/confirm/execute protocol: ask the tool layer
//! whether an extracted action needs explicit confirmation. Transport
//! and parse failures propagate; a failed stage is never silently
//! treated as "nothing to confirm".

use crate::error::OrchestratorError;
use crate::models::{ActionParams, PendingAction};
use crate::tools::ToolClient;
use crate::Result;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of staging an action with the tool layer.
#[derive(Debug, Clone)]
pub enum StageOutcome {
    /// The action awaits explicit user confirmation.
    Staged(PendingAction),
    /// No confirmation needed; the tool layer answered directly.
    Direct(String),
}

/// Stages extracted actions with the tool layer
pub struct ActionStager {
    tools: Arc<dyn ToolClient>,
}

impl ActionStager {
    pub fn new(tools: Arc<dyn ToolClient>) -> Self {
        Self { tools }
    }

    pub async fn stage(&self, params: ActionParams) -> Result<StageOutcome> {
        let kind = params.kind();
        let payload = serde_json::to_value(&params)?;

        let response = self.tools.execute_tool(kind.as_str(), payload).await?;

        if let Some(error) = response.error {
            return Err(OrchestratorError::ToolError(format!(
                "{} failed: {}",
                kind, error
            )));
        }

        if !response.success {
            return Err(OrchestratorError::ToolError(format!(
                "{} reported failure without detail",
                kind
            )));
        }

        if !response.requires_confirmation {
            let text = response
                .confirmation_message
                .or_else(|| text_from_data(response.data.as_ref()))
                .unwrap_or_else(|| format!("Done — {} handled directly.", kind));
            return Ok(StageOutcome::Direct(text));
        }

        let action_id = response.action_id.ok_or_else(|| {
            OrchestratorError::MalformedResponse(format!(
                "{} requires confirmation but carried no action_id",
                kind
            ))
        })?;

        if let Some(reported) = response.action_type.as_deref() {
            if reported != kind.as_str() {
                warn!(
                    expected = kind.as_str(),
                    reported, "Tool layer reported a different action type; keeping local params"
                );
            }
        }

        let confirmation_text = response
            .confirmation_message
            .unwrap_or_else(|| default_confirmation(&params));

        info!(action_id = %action_id, action = %kind, "Action staged, awaiting confirmation");

        Ok(StageOutcome::Staged(PendingAction {
            id: action_id,
            params,
            confirmation_text,
            created_at: Utc::now(),
        }))
    }
}

fn text_from_data(data: Option<&Value>) -> Option<String> {
    data.and_then(|d| d.get("message"))
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

/// Fallback confirmation text when the tool layer didn't send one.
fn default_confirmation(params: &ActionParams) -> String {
    match params {
        ActionParams::CreateBudget {
            amount,
            category,
            period,
            ..
        } => format!(
            "Create a {} budget of ₹{:.0} for {}?",
            period, amount, category
        ),
        ActionParams::CreateSavingsGoal {
            name,
            target_amount,
            ..
        } => format!("Create a savings goal \"{}\" with a target of ₹{:.0}?", name, target_amount),
        ActionParams::CreateScheduledPayment {
            name,
            amount,
            due_date,
            frequency,
            ..
        } => format!(
            "Schedule a {} payment of ₹{:.0} for {} starting {}?",
            frequency, amount, name, due_date
        ),
        ActionParams::AddTransaction {
            description,
            amount,
            direction,
            ..
        } => format!("Record a ₹{:.0} {} for {}?", amount, direction, description),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrchestratorError;
    use crate::models::BudgetPeriod;
    use crate::tools::{MockToolClient, ToolResponse};
    use async_trait::async_trait;

    fn budget_params() -> ActionParams {
        ActionParams::CreateBudget {
            name: "Food".to_string(),
            amount: 5000.0,
            category: "Food".to_string(),
            period: BudgetPeriod::Monthly,
        }
    }

    struct DirectToolClient;

    #[async_trait]
    impl ToolClient for DirectToolClient {
        async fn execute_tool(&self, _: &str, _: Value) -> crate::Result<ToolResponse> {
            Ok(ToolResponse {
                success: true,
                requires_confirmation: false,
                confirmation_message: Some("Budget noted.".to_string()),
                ..Default::default()
            })
        }
    }

    struct BrokenToolClient;

    #[async_trait]
    impl ToolClient for BrokenToolClient {
        async fn execute_tool(&self, _: &str, _: Value) -> crate::Result<ToolResponse> {
            Err(OrchestratorError::Transport("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_stage_produces_pending_action() {
        let stager = ActionStager::new(Arc::new(MockToolClient));
        let outcome = stager.stage(budget_params()).await.unwrap();

        match outcome {
            StageOutcome::Staged(action) => {
                assert!(!action.id.is_empty());
                assert!(action.confirmation_text.contains("5000"));
                assert!(action.confirmation_text.contains("Food"));
            }
            StageOutcome::Direct(_) => panic!("expected staged action"),
        }
    }

    #[tokio::test]
    async fn test_no_confirmation_needed_is_direct() {
        let stager = ActionStager::new(Arc::new(DirectToolClient));
        let outcome = stager.stage(budget_params()).await.unwrap();

        assert!(matches!(outcome, StageOutcome::Direct(text) if text == "Budget noted."));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let stager = ActionStager::new(Arc::new(BrokenToolClient));
        let err = stager.stage(budget_params()).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Transport(_)));
    }
}
