//! Tool layer boundary
//!
//! The tool layer executes named operations (budget/goal/payment staging,
//! web and product search) and reports whether an action needs explicit
//! confirmation. Only the call/response contract lives here; the service
//! itself is external.

use crate::error::{OrchestratorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Response envelope from `execute_tool`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolResponse {
    pub success: bool,
    #[serde(default)]
    pub requires_confirmation: bool,
    #[serde(default)]
    pub confirmation_message: Option<String>,
    #[serde(default)]
    pub action_id: Option<String>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub action_data: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Trait for the external tool service
#[async_trait]
pub trait ToolClient: Send + Sync {
    async fn execute_tool(&self, name: &str, params: Value) -> Result<ToolResponse>;
}

//
// ================= Search Tools =================
//

/// The search tools the tool layer recognizes. Each has its own result
/// payload shape, so the normalizer is selected by this enum rather than
/// by sniffing the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTool {
    WebSearch,
    Amazon,
    Flipkart,
    Shopping,
}

impl SearchTool {
    pub fn name(&self) -> &'static str {
        match self {
            SearchTool::WebSearch => "web_search",
            SearchTool::Amazon => "search_amazon",
            SearchTool::Flipkart => "search_flipkart",
            SearchTool::Shopping => "search_shopping",
        }
    }

    /// Platform label shown on result cards.
    pub fn label(&self) -> &'static str {
        match self {
            SearchTool::WebSearch => "Web",
            SearchTool::Amazon => "Amazon",
            SearchTool::Flipkart => "Flipkart",
            SearchTool::Shopping => "Shopping",
        }
    }

    /// Pick the search tool for a query: explicit platform names first,
    /// then generic shopping verbs, else plain web search.
    pub fn for_query(text: &str) -> Self {
        let lowered = text.to_lowercase();

        if lowered.contains("amazon") {
            SearchTool::Amazon
        } else if lowered.contains("flipkart") {
            SearchTool::Flipkart
        } else if ["buy", "purchase", "order", "price", "shopping", "product", "deal"]
            .iter()
            .any(|k| lowered.contains(k))
        {
            SearchTool::Shopping
        } else {
            SearchTool::WebSearch
        }
    }
}

//
// ================= HTTP Client =================
//

struct ToolApi {
    client: Client,
    base_url: String,
}

/// HTTP-backed tool client.
///
/// Holds an optional inner API so a missing `TOOLS_API_BASE_URL` becomes
/// a configuration error at call time instead of a construction failure.
pub struct HttpToolClient {
    inner: Option<ToolApi>,
}

impl HttpToolClient {
    pub fn from_env() -> Self {
        let base_url = env::var("TOOLS_API_BASE_URL").ok();

        let inner = base_url.and_then(|url| {
            let client = Client::builder()
                .pool_idle_timeout(Duration::from_secs(60))
                .pool_max_idle_per_host(8)
                .timeout(Duration::from_secs(30))
                .build()
                .ok()?;

            Some(ToolApi {
                client,
                base_url: url.trim_end_matches('/').to_string(),
            })
        });

        if inner.is_none() {
            warn!("TOOLS_API_BASE_URL not set; tool calls will fail until configured");
        }

        Self { inner }
    }
}

#[async_trait]
impl ToolClient for HttpToolClient {
    async fn execute_tool(&self, name: &str, params: Value) -> Result<ToolResponse> {
        let api = self.inner.as_ref().ok_or_else(|| {
            OrchestratorError::Configuration("TOOLS_API_BASE_URL is not configured".to_string())
        })?;

        let url = format!("{}/api/v1/tools/execute", api.base_url);

        info!(tool = name, "Calling tool layer");

        let response = api
            .client
            .post(&url)
            .json(&json!({ "tool": name, "params": params }))
            .send()
            .await
            .map_err(|e| {
                OrchestratorError::Transport(format!("tool request failed for {}: {}", name, e))
            })?;

        let status = response.status();
        let body = response.json::<Value>().await.map_err(|e| {
            OrchestratorError::MalformedResponse(format!(
                "tool {} returned invalid JSON: {}",
                name, e
            ))
        })?;

        if !status.is_success() {
            return Err(OrchestratorError::ToolError(format!(
                "tool API returned {} for {}: {}",
                status, name, body
            )));
        }

        serde_json::from_value::<ToolResponse>(body).map_err(|e| {
            OrchestratorError::MalformedResponse(format!(
                "tool {} response shape mismatch: {}",
                name, e
            ))
        })
    }
}

//
// ================= Mock Client =================
//

/// Mock tool client for development & testing.
/// Stages every mutation and serves canned search results.
pub struct MockToolClient;

#[async_trait]
impl ToolClient for MockToolClient {
    async fn execute_tool(&self, name: &str, params: Value) -> Result<ToolResponse> {
        match name {
            "create_budget" | "create_savings_goal" | "create_scheduled_payment"
            | "add_transaction" => Ok(ToolResponse {
                success: true,
                requires_confirmation: true,
                confirmation_message: None,
                action_id: Some(format!("mock-{}", Uuid::new_v4())),
                action_type: Some(name.to_string()),
                action_data: Some(params),
                data: None,
                error: None,
            }),
            "web_search" => Ok(ToolResponse {
                success: true,
                data: Some(json!({
                    "results": [
                        {
                            "title": "Understanding SIP returns",
                            "snippet": "A systematic investment plan spreads purchases over time...",
                            "url": "https://example.com/sip",
                            "source": "example.com"
                        }
                    ]
                })),
                ..Default::default()
            }),
            "search_amazon" | "search_flipkart" | "search_shopping" => {
                let key = match name {
                    "search_amazon" => "amazon",
                    "search_flipkart" => "flipkart",
                    _ => "shopping_results",
                };
                Ok(ToolResponse {
                    success: true,
                    data: Some(json!({
                        key: [
                            {
                                "title": "boAt Airdopes 141",
                                "snippet": "Wireless earbuds with 42H playtime",
                                "url": "https://example.com/airdopes",
                                "price": "₹1,299",
                                "thumbnail": "https://example.com/airdopes.jpg"
                            }
                        ]
                    })),
                    ..Default::default()
                })
            }
            _ => Err(OrchestratorError::ToolError(format!(
                "unknown tool: {}",
                name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_tool_selection() {
        assert_eq!(
            SearchTool::for_query("find earbuds on amazon"),
            SearchTool::Amazon
        );
        assert_eq!(
            SearchTool::for_query("search Flipkart for shoes"),
            SearchTool::Flipkart
        );
        assert_eq!(
            SearchTool::for_query("buy a phone under 20000"),
            SearchTool::Shopping
        );
        assert_eq!(
            SearchTool::for_query("search current repo rate"),
            SearchTool::WebSearch
        );
    }

    #[tokio::test]
    async fn test_mock_stages_mutations() {
        let client = MockToolClient;
        let response = client
            .execute_tool("create_budget", json!({"amount": 5000}))
            .await
            .unwrap();

        assert!(response.success);
        assert!(response.requires_confirmation);
        assert!(response.action_id.is_some());
    }

    #[tokio::test]
    async fn test_unconfigured_http_client_is_configuration_error() {
        std::env::remove_var("TOOLS_API_BASE_URL");
        let client = HttpToolClient::from_env();
        let err = client
            .execute_tool("web_search", json!({"query": "test"}))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Configuration(_)));
    }
}
