//! Finance Chat Orchestrator
//!
//! The conversational layer of a personal-finance app. It turns free-text
//! user messages into either a plain reply or a staged financial action
//! that must be explicitly confirmed before it mutates any data:
//! - Deterministic keyword intent routing (no model in the loop)
//! - Regex slot extraction with safe fallback to clarifying prompts
//! - Two-phase stage/confirm/execute protocol for mutations
//! - One uniform message model for text, results, staged actions, errors
//! - Resilience against the LLM, tool, and data services
//!
//! TURN LOOP:
//! INPUT → ROUTE → EXTRACT → STAGE → AWAIT CONFIRM → EXECUTE → NORMALIZE

pub mod agent;
pub mod api;
pub mod context;
pub mod data;
pub mod error;
pub mod executor;
pub mod intent;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod session;
pub mod slots;
pub mod stager;
pub mod tools;

pub use error::Result;

// Re-export common types
pub use intent::{Intent, IntentRouter};
pub use models::*;
pub use session::ChatSession;
