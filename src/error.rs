//! Error types for the chat orchestration layer

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[derive(Error, Debug)]
pub enum OrchestratorError {

    // =============================
    // Core Taxonomy
    // =============================

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unknown action type: {0}")]
    UnknownAction(String),

    #[error("Tool error: {0}")]
    ToolError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Session busy: {0}")]
    SessionBusy(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("UUID parse error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OrchestratorError {
    /// User-facing text for this error. Raw transport and parse detail
    /// stays in the logs; the chat surface only ever sees these strings.
    pub fn user_message(&self) -> String {
        match self {
            OrchestratorError::Transport(_) | OrchestratorError::HttpError(_) => {
                "That's taking too long or I couldn't connect. Please try again in a moment."
                    .to_string()
            }
            OrchestratorError::Configuration(_) => {
                "The assistant isn't fully configured yet. Please check the app configuration."
                    .to_string()
            }
            OrchestratorError::MalformedResponse(_)
            | OrchestratorError::SerializationError(_) => {
                "Sorry, something went wrong while processing that. Please try again.".to_string()
            }
            OrchestratorError::UnknownAction(kind) => {
                format!("I don't know how to perform the action \"{}\".", kind)
            }
            OrchestratorError::SessionBusy(_) => {
                "I'm still working on your previous message. One thing at a time!".to_string()
            }
            _ => "Sorry, I ran into a problem handling that. Please try again.".to_string(),
        }
    }
}
