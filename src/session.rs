//! Chat session state
//!
//! One explicit session object owns everything a chat screen needs:
//! the ordered message log, the outstanding staged actions, and the
//! one-request-at-a-time busy gate. Created at session start, torn down
//! at session end; no global state survives it.

use crate::models::{ChatTurn, Message, PendingAction};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Most recent turns passed to the chat layer as context.
pub const LLM_CONTEXT_TURNS: usize = 20;

/// Lookup outcome for a confirm/cancel by action id.
#[derive(Debug, Clone)]
pub enum ActionLookup {
    /// Action was outstanding and is now consumed.
    Staged(PendingAction),
    /// Action was already confirmed or cancelled earlier.
    AlreadyResolved,
    /// Id was never staged in this session.
    Unknown,
}

/// Per-screen conversation session.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    messages: Vec<Message>,
    outstanding: HashMap<String, PendingAction>,
    resolved: HashSet<String>,
    busy: bool,
}

impl ChatSession {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            messages: Vec::new(),
            outstanding: HashMap::new(),
            resolved: HashSet::new(),
            busy: false,
        }
    }

    // =============================
    // Busy gate
    // =============================

    /// Claim the session for one turn. Returns false while a prior
    /// request is still in flight.
    pub fn begin_turn(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    pub fn end_turn(&mut self) {
        self.busy = false;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    // =============================
    // Message log
    // =============================

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Context turns for the chat layer: the most recent
    /// [`LLM_CONTEXT_TURNS`] messages, skipping welcome notices and
    /// empty texts. Call this *before* appending the in-flight user
    /// message; the message being answered is never its own context.
    pub fn llm_turns(&self) -> Vec<ChatTurn> {
        let mut turns: Vec<ChatTurn> = self
            .messages
            .iter()
            .rev()
            .filter(|m| !m.welcome && !m.text.is_empty())
            .take(LLM_CONTEXT_TURNS)
            .map(|m| ChatTurn {
                role: m.role,
                content: m.text.clone(),
            })
            .collect();

        turns.reverse();
        turns
    }

    // =============================
    // Pending actions
    // =============================

    pub fn stage_action(&mut self, action: PendingAction) {
        self.outstanding.insert(action.id.clone(), action);
        self.updated_at = Utc::now();
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }

    /// Consume a staged action by id. A consumed id stays resolved for
    /// the life of the session, so a stale confirm or cancel can never
    /// trigger a second mutation.
    pub fn take_action(&mut self, action_id: &str) -> ActionLookup {
        if self.resolved.contains(action_id) {
            return ActionLookup::AlreadyResolved;
        }

        match self.outstanding.remove(action_id) {
            Some(action) => {
                self.resolved.insert(action_id.to_string());
                self.updated_at = Utc::now();
                ActionLookup::Staged(action)
            }
            None => ActionLookup::Unknown,
        }
    }
}
