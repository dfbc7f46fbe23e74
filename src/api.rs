//! REST API for the chat orchestration layer
//!
//! Thin HTTP shell the mobile UI talks to: one endpoint to send a
//! message, two to resolve a staged action. Sessions live in app state
//! for the life of the process, one per session id.

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tracing::info;
use uuid::Uuid;

use crate::agent::ChatOrchestrator;
use crate::models::Message;
use crate::session::ChatSession;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub session_id: String,
    pub action_id: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<ChatOrchestrator>,
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<ChatSession>>>>>,
}

impl ApiState {
    pub fn new(orchestrator: Arc<ChatOrchestrator>) -> Self {
        Self {
            orchestrator,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn get_or_create_session(
        &self,
        session_id: Option<Uuid>,
        user_id: Uuid,
    ) -> (Uuid, Arc<Mutex<ChatSession>>) {
        if let Some(id) = session_id {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(&id) {
                return (id, session.clone());
            }
        }

        let session = ChatSession::new(user_id);
        let id = session.session_id;
        let handle = Arc::new(Mutex::new(session));

        self.sessions.write().await.insert(id, handle.clone());
        (id, handle)
    }

    async fn get_session(&self, session_id: Uuid) -> Option<Arc<Mutex<ChatSession>>> {
        self.sessions.read().await.get(&session_id).cloned()
    }
}

/// =============================
/// Helpers: Stable IDs
/// =============================

fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

fn parse_or_stable_uuid(value: Option<&str>, fallback_seed: &str) -> Uuid {
    match value {
        Some(v) if !v.trim().is_empty() => {
            Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v))
        }
        _ => stable_uuid_from_string(fallback_seed),
    }
}

fn message_payload(session_id: Uuid, message: &Message) -> serde_json::Value {
    serde_json::json!({
        "session_id": session_id.to_string(),
        "message": message,
    })
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Message must not be empty".into())),
        );
    }

    let user_id = parse_or_stable_uuid(req.user_id.as_deref(), "anonymous-user");
    let session_id = req
        .session_id
        .as_deref()
        .and_then(|s| Uuid::parse_str(s).ok());

    let (session_id, session) = state.get_or_create_session(session_id, user_id).await;

    info!(session_id = %session_id, user_id = %user_id, "Received chat message");

    // One request in flight per session: a contended lock means the UI
    // fired a second send before the first finished.
    let Ok(mut session) = session.try_lock() else {
        return (
            StatusCode::CONFLICT,
            Json(ApiResponse::error(
                "A previous message is still being processed".into(),
            )),
        );
    };

    let reply = state
        .orchestrator
        .handle_message(&mut session, &req.message)
        .await;

    (
        StatusCode::OK,
        Json(ApiResponse::success(message_payload(session_id, &reply))),
    )
}

/// =============================
/// Confirm / Cancel Endpoints
/// =============================

async fn confirm_handler(
    State(state): State<ApiState>,
    Json(req): Json<ActionRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    resolve_action(state, req, true).await
}

async fn cancel_handler(
    State(state): State<ApiState>,
    Json(req): Json<ActionRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    resolve_action(state, req, false).await
}

async fn resolve_action(
    state: ApiState,
    req: ActionRequest,
    confirm: bool,
) -> (StatusCode, Json<ApiResponse>) {
    let Some(session_id) = Uuid::parse_str(&req.session_id).ok() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Invalid session id".into())),
        );
    };

    let Some(session) = state.get_session(session_id).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Unknown session".into())),
        );
    };

    let Ok(mut session) = session.try_lock() else {
        return (
            StatusCode::CONFLICT,
            Json(ApiResponse::error(
                "A previous message is still being processed".into(),
            )),
        );
    };

    let reply = if confirm {
        state
            .orchestrator
            .confirm(&mut session, &req.action_id)
            .await
    } else {
        state
            .orchestrator
            .cancel(&mut session, &req.action_id)
            .await
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(message_payload(session_id, &reply))),
    )
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<ChatOrchestrator>) -> Router {
    let state = ApiState::new(orchestrator);

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/confirm", post(confirm_handler))
        .route("/api/cancel", post(cancel_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    orchestrator: Arc<ChatOrchestrator>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
