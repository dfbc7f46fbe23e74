//! Chat turn orchestration
//!
//! Drives one turn through the state machine:
//!
//! INPUT → ROUTE → EXTRACT → STAGE → AWAIT CONFIRM → EXECUTE → NORMALIZE
//!
//! Every external failure is caught here and converted to an error-kind
//! message before it can reach the UI; nothing upstream of the
//! normalizer ever sees an unhandled error. All states are transient;
//! the only cross-turn state is the session's message log and its
//! outstanding pending actions.

use crate::context::ContextBuilder;
use crate::data::DataStore;
use crate::error::OrchestratorError;
use crate::executor::ActionExecutor;
use crate::intent::{Intent, IntentRouter};
use crate::llm::ChatClient;
use crate::models::{ActionParams, ChatTurn, Message};
use crate::normalize::{sanitize, ResponseNormalizer, MAX_RESULT_ITEMS};
use crate::session::{ActionLookup, ChatSession};
use crate::slots::{parse_action_payload, SlotExtractor};
use crate::stager::{ActionStager, StageOutcome};
use crate::tools::{SearchTool, ToolClient};
use crate::Result;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Coordinates one chat session's turns end to end
pub struct ChatOrchestrator {
    chat: Arc<dyn ChatClient>,
    tools: Arc<dyn ToolClient>,
    context: ContextBuilder,
    stager: ActionStager,
    executor: ActionExecutor,
}

impl ChatOrchestrator {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        tools: Arc<dyn ToolClient>,
        store: Arc<dyn DataStore>,
    ) -> Self {
        Self {
            chat,
            context: ContextBuilder::new(store.clone()),
            stager: ActionStager::new(tools.clone()),
            executor: ActionExecutor::new(store),
            tools,
        }
    }

    /// Handle one user message. Always returns a displayable message;
    /// failures surface as `kind = Error`, never as a propagated error.
    pub async fn handle_message(&self, session: &mut ChatSession, text: &str) -> Message {
        if !session.begin_turn() {
            return ResponseNormalizer::busy();
        }

        let reply = match self.run_turn(session, text).await {
            Ok(message) => message,
            Err(error) => {
                warn!(error = %error, "Turn ended in error state");
                ResponseNormalizer::from_error(&error)
            }
        };

        session.push(reply.clone());
        session.end_turn();
        reply
    }

    async fn run_turn(&self, session: &mut ChatSession, text: &str) -> Result<Message> {
        // Context snapshot first: the message being answered is never
        // part of its own history.
        let history = session.llm_turns();
        session.push(Message::user(text));

        let intent = IntentRouter::route(text);
        debug!(?intent, "Message routed");

        match intent {
            Intent::Search => self.handle_search(text).await,
            Intent::Budget => match SlotExtractor::budget(text) {
                Some(slots) => {
                    let params = ActionParams::CreateBudget {
                        name: slots.category.clone(),
                        amount: slots.amount,
                        category: slots.category,
                        period: slots.period,
                    };
                    self.stage_and_reply(session, params).await
                }
                None => Ok(ResponseNormalizer::clarification(intent)),
            },
            Intent::Goal => match SlotExtractor::goal(text) {
                Some(slots) => {
                    let params = ActionParams::CreateSavingsGoal {
                        name: slots.name,
                        target_amount: slots.amount,
                        deadline: None,
                    };
                    self.stage_and_reply(session, params).await
                }
                None => Ok(ResponseNormalizer::clarification(intent)),
            },
            Intent::Payment => {
                match SlotExtractor::payment(text, Utc::now().date_naive()) {
                    Some(slots) => {
                        let params = ActionParams::CreateScheduledPayment {
                            name: slots.name,
                            amount: slots.amount,
                            category: slots.category,
                            due_date: slots.due_date,
                            frequency: slots.frequency,
                        };
                        self.stage_and_reply(session, params).await
                    }
                    None => Ok(ResponseNormalizer::clarification(intent)),
                }
            }
            // Calculations lean on the model plus the financial context;
            // deterministic math lives behind the data layer.
            Intent::Calculation | Intent::GeneralChat => {
                self.handle_chat(session, text, &history).await
            }
        }
    }

    async fn stage_and_reply(
        &self,
        session: &mut ChatSession,
        params: ActionParams,
    ) -> Result<Message> {
        match self.stager.stage(params).await? {
            StageOutcome::Staged(action) => {
                session.stage_action(action.clone());
                Ok(Message::pending(action))
            }
            StageOutcome::Direct(text) => Ok(Message::assistant(sanitize(&text))),
        }
    }

    async fn handle_search(&self, text: &str) -> Result<Message> {
        let tool = SearchTool::for_query(text);

        let response = self
            .tools
            .execute_tool(tool.name(), json!({ "query": text, "limit": MAX_RESULT_ITEMS }))
            .await?;

        if let Some(error) = &response.error {
            return Err(OrchestratorError::ToolError(format!(
                "{} failed: {}",
                tool.name(),
                error
            )));
        }

        Ok(ResponseNormalizer::from_search(tool, &response, text))
    }

    async fn handle_chat(
        &self,
        session: &mut ChatSession,
        text: &str,
        history: &[ChatTurn],
    ) -> Result<Message> {
        let context = self.context.build(session.user_id).await;

        let reply = self
            .chat
            .chat(text, session.user_id, &context.to_value(), history)
            .await?;

        if let Some(error) = &reply.error {
            return Err(OrchestratorError::LlmError(error.clone()));
        }

        // The model can propose an action itself; it goes through the
        // same stage/confirm path as keyword-routed ones.
        if reply.needs_confirmation {
            if let Some(action_type) = &reply.action_type {
                let params = parse_action_payload(
                    action_type,
                    reply.action_data.as_ref(),
                    Utc::now().date_naive(),
                )?;
                return self.stage_and_reply(session, params).await;
            }
        }

        Ok(ResponseNormalizer::from_chat(&reply))
    }

    /// User confirmed a staged action. A stale or repeated confirm is an
    /// explicit no-op reply, never a second mutation.
    pub async fn confirm(&self, session: &mut ChatSession, action_id: &str) -> Message {
        if !session.begin_turn() {
            return ResponseNormalizer::busy();
        }

        let reply = match session.take_action(action_id) {
            ActionLookup::Staged(action) => {
                info!(action_id = %action_id, action = %action.params.kind(), "Executing confirmed action");
                let result = self.executor.execute(session.user_id, &action.params).await;
                ResponseNormalizer::from_execution(&result)
            }
            ActionLookup::AlreadyResolved => ResponseNormalizer::already_handled(),
            ActionLookup::Unknown => ResponseNormalizer::unknown_action(),
        };

        session.push(reply.clone());
        session.end_turn();
        reply
    }

    /// User cancelled a staged action. Discards it without any data call.
    pub async fn cancel(&self, session: &mut ChatSession, action_id: &str) -> Message {
        if !session.begin_turn() {
            return ResponseNormalizer::busy();
        }

        let reply = match session.take_action(action_id) {
            ActionLookup::Staged(action) => {
                info!(action_id = %action_id, action = %action.params.kind(), "Action cancelled");
                ResponseNormalizer::cancelled()
            }
            ActionLookup::AlreadyResolved => ResponseNormalizer::already_handled(),
            ActionLookup::Unknown => ResponseNormalizer::unknown_action(),
        };

        session.push(reply.clone());
        session.end_turn();
        reply
    }
}
