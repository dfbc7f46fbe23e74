//! Chat/LLM layer boundary
//!
//! Gemini-backed chat client for conversational turns. The model answers
//! with plain text and may propose a financial action by embedding a
//! ```json fenced block carrying an "action" key; that block is lifted
//! out of the display text and surfaced as a typed proposal.

use crate::error::OrchestratorError;
use crate::models::{ChatTurn, MessageRole};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

/// One supporting source attached to a chat reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatSource {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

/// Reply from the chat layer.
#[derive(Debug, Clone, Default)]
pub struct ChatReply {
    pub response: String,
    pub action_type: Option<String>,
    pub action_data: Option<Value>,
    pub needs_confirmation: bool,
    pub sources: Vec<ChatSource>,
    pub error: Option<String>,
}

/// Trait for the external chat service
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(
        &self,
        query: &str,
        user_id: Uuid,
        user_context: &Value,
        history: &[ChatTurn],
    ) -> Result<ChatReply>;
}

//
// ================= Gemini Client =================
//

/// Reusable Gemini client (connection-pooled)
pub struct GeminiChatClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiChatClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent".to_string(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("GEMINI_API_KEY").unwrap_or_default())
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn chat(
        &self,
        query: &str,
        user_id: Uuid,
        user_context: &Value,
        history: &[ChatTurn],
    ) -> Result<ChatReply> {
        if self.api_key.is_empty() || self.api_key == "your_gemini_api_key_here" {
            return Err(OrchestratorError::Configuration(
                "GEMINI_API_KEY not configured. Set it in your .env file.".to_string(),
            ));
        }

        let url = format!("{}?key={}", self.base_url, self.api_key);

        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content {
                role: Some(role_for_gemini(turn.role).to_string()),
                parts: vec![Part {
                    text: turn.content.clone(),
                }],
            })
            .collect();
        contents.push(Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: query.to_string(),
            }],
        });

        let request = GeminiRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: 0.3,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 1024,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: build_system_prompt(user_context),
                }],
            },
        };

        info!(user_id = %user_id, history_turns = history.len(), "Calling Gemini API");

        let response = self.client.post(&url).json(&request).send().await.map_err(|e| {
            error!("Gemini API request failed: {}", e);
            OrchestratorError::Transport(format!("Gemini API error: {}", e))
        })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error response: {}", error_text);
            return Err(OrchestratorError::LlmError(format!(
                "Gemini API error: {}",
                error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            OrchestratorError::MalformedResponse(format!("Gemini parse error: {}", e))
        })?;

        let answer = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| {
                OrchestratorError::LlmError("Empty response from Gemini".to_string())
            })?;

        // Lift an embedded action proposal out of the display text.
        let (response_text, action) = match extract_action_block(&answer) {
            Some((parsed, cleaned)) => (cleaned, Some(parsed)),
            None => (answer, None),
        };

        let (action_type, action_data, needs_confirmation) = match action {
            Some(parsed) => {
                let action_type = parsed
                    .get("action")
                    .and_then(Value::as_str)
                    .map(|s| s.to_string());
                (action_type, Some(parsed), true)
            }
            None => (None, None, false),
        };

        Ok(ChatReply {
            response: response_text,
            action_type,
            action_data,
            needs_confirmation,
            sources: Vec::new(),
            error: None,
        })
    }
}

fn role_for_gemini(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "model",
    }
}

/// Build the system prompt, embedding the user's financial context.
fn build_system_prompt(user_context: &Value) -> String {
    let base_prompt = r#"You are a friendly personal finance assistant for an Indian household budgeting app.

Guidelines:
- Be concise, practical, and encouraging
- Use rupee amounts the way the user writes them
- When the user asks you to create a budget, savings goal, scheduled payment, or record a transaction, append a ```json block with an "action" key naming one of: create_budget, create_savings_goal, create_scheduled_payment, add_transaction, plus its parameters
- Never invent account data that is not in the provided context"#;

    format!(
        "{}\n\nUser context:\n{}",
        base_prompt,
        serde_json::to_string_pretty(user_context).unwrap_or_else(|_| "{}".to_string())
    )
}

/// Try to extract a JSON action proposal from a ```json ... ``` fenced
/// block. Returns the parsed block and the display text with the block
/// removed, only when the block parses and carries an "action" key.
fn extract_action_block(text: &str) -> Option<(Value, String)> {
    let start = text.find("```json")?;
    let after_fence = &text[start + 7..]; // skip "```json"
    let end = after_fence.find("```")?;
    let json_str = after_fence[..end].trim();

    let parsed: Value = serde_json::from_str(json_str).ok()?;
    if !(parsed.is_object() && parsed.get("action").is_some()) {
        return None;
    }

    let mut cleaned = text[..start].trim_end().to_string();
    let rest = after_fence[end + 3..].trim();
    if !rest.is_empty() {
        cleaned.push('\n');
        cleaned.push_str(rest);
    }

    Some((parsed, cleaned))
}

//
// ================= Wire Structs =================
//

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

//
// ================= Mock Client =================
//

/// Mock chat client for development & testing.
/// Keeps the orchestrator functional without an LLM dependency.
#[derive(Default)]
pub struct MockChatClient {
    pub reply: String,
    pub action: Option<(String, Value)>,
}

impl MockChatClient {
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            action: None,
        }
    }

    pub fn with_action(reply: impl Into<String>, action_type: &str, data: Value) -> Self {
        Self {
            reply: reply.into(),
            action: Some((action_type.to_string(), data)),
        }
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn chat(
        &self,
        query: &str,
        _user_id: Uuid,
        _user_context: &Value,
        _history: &[ChatTurn],
    ) -> Result<ChatReply> {
        let response = if self.reply.is_empty() {
            format!("You asked: {}", query)
        } else {
            self.reply.clone()
        };

        Ok(ChatReply {
            response,
            action_type: self.action.as_ref().map(|(t, _)| t.clone()),
            action_data: self.action.as_ref().map(|(_, d)| d.clone()),
            needs_confirmation: self.action.is_some(),
            sources: Vec::new(),
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: "How do I start budgeting?".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 1024,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: "You are a finance assistant".to_string(),
                }],
            },
        };

        let json = serde_json::to_string(&request);
        assert!(json.is_ok());
        assert!(json.unwrap().contains("How do I start budgeting?"));
    }

    #[test]
    fn test_extract_action_block() {
        let text = "Sure, I can set that up.\n```json\n{\"action\": \"create_budget\", \"amount\": 5000, \"category\": \"Food\"}\n```\nJust confirm below.";

        let (parsed, cleaned) = extract_action_block(text).unwrap();
        assert_eq!(parsed["action"], "create_budget");
        assert!(cleaned.contains("Sure, I can set that up."));
        assert!(cleaned.contains("Just confirm below."));
        assert!(!cleaned.contains("```"));
    }

    #[test]
    fn test_fenced_block_without_action_key_is_left_alone() {
        let text = "Here's a sample:\n```json\n{\"note\": \"nothing to do\"}\n```";
        assert!(extract_action_block(text).is_none());
    }

    #[test]
    fn test_mock_action_reply() {
        let client = MockChatClient::with_action(
            "Recording that expense.",
            "add_transaction",
            json!({"amount": 250, "description": "Coffee"}),
        );
        let reply = tokio_test::block_on(client.chat(
            "I spent 250 on coffee",
            Uuid::new_v4(),
            &json!({}),
            &[],
        ))
        .unwrap();

        assert!(reply.needs_confirmation);
        assert_eq!(reply.action_type.as_deref(), Some("add_transaction"));
    }
}
