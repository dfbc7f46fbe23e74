//! Core data models for the conversational finance assistant

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Plain,
    ResultSet,
    PendingAction,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentFrequency {
    Weekly,
    Biweekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionDirection {
    #[default]
    Expense,
    Income,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        }
    }
}

impl PaymentFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFrequency::Weekly => "weekly",
            PaymentFrequency::Biweekly => "biweekly",
            PaymentFrequency::Monthly => "monthly",
            PaymentFrequency::Quarterly => "quarterly",
            PaymentFrequency::Yearly => "yearly",
        }
    }
}

impl TransactionDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionDirection::Expense => "expense",
            TransactionDirection::Income => "income",
        }
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for TransactionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//
// ================= Actions =================
//

/// The four state-mutating actions the tool layer recognizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CreateBudget,
    CreateSavingsGoal,
    CreateScheduledPayment,
    AddTransaction,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::CreateBudget => "create_budget",
            ActionKind::CreateSavingsGoal => "create_savings_goal",
            ActionKind::CreateScheduledPayment => "create_scheduled_payment",
            ActionKind::AddTransaction => "add_transaction",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "create_budget" => Some(ActionKind::CreateBudget),
            "create_savings_goal" => Some(ActionKind::CreateSavingsGoal),
            "create_scheduled_payment" => Some(ActionKind::CreateScheduledPayment),
            "add_transaction" => Some(ActionKind::AddTransaction),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed parameters for a staged action, one variant per [`ActionKind`].
///
/// The tag doubles as the tool-layer action name, so serializing a value
/// produces exactly the payload `execute_tool` expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionParams {
    CreateBudget {
        name: String,
        amount: f64,
        category: String,
        period: BudgetPeriod,
    },
    CreateSavingsGoal {
        name: String,
        target_amount: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        deadline: Option<NaiveDate>,
    },
    CreateScheduledPayment {
        name: String,
        amount: f64,
        category: String,
        due_date: NaiveDate,
        frequency: PaymentFrequency,
    },
    AddTransaction {
        description: String,
        amount: f64,
        category: String,
        direction: TransactionDirection,
        #[serde(skip_serializing_if = "Option::is_none")]
        date: Option<NaiveDate>,
    },
}

impl ActionParams {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionParams::CreateBudget { .. } => ActionKind::CreateBudget,
            ActionParams::CreateSavingsGoal { .. } => ActionKind::CreateSavingsGoal,
            ActionParams::CreateScheduledPayment { .. } => ActionKind::CreateScheduledPayment,
            ActionParams::AddTransaction { .. } => ActionKind::AddTransaction,
        }
    }

    /// Amount being moved or reserved, whatever the variant calls it.
    pub fn amount(&self) -> f64 {
        match self {
            ActionParams::CreateBudget { amount, .. } => *amount,
            ActionParams::CreateSavingsGoal { target_amount, .. } => *target_amount,
            ActionParams::CreateScheduledPayment { amount, .. } => *amount,
            ActionParams::AddTransaction { amount, .. } => *amount,
        }
    }
}

/// A staged, not-yet-applied mutation awaiting explicit user confirmation.
///
/// Lives only for the current session; consumed exactly once on confirm or
/// discarded on cancel. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    /// Opaque identifier issued by the tool layer
    pub id: String,
    pub params: ActionParams,
    /// Human-readable description shown to the user before confirming
    pub confirmation_text: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of executing a confirmed action against the data layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub detail: String,
}

//
// ================= Rich Text =================
//

/// One inline span of display text. URLs stay separately actionable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Span {
    Text(String),
    Bold(String),
    Link { label: String, url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Paragraph,
    Bullet,
    Numbered(u32),
    Heading,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RichLine {
    pub kind: LineKind,
    pub spans: Vec<Span>,
}

/// Sanitized display text with formatting semantics preserved as
/// structured spans rather than raw markup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RichText {
    pub lines: Vec<RichLine>,
}

impl RichText {
    /// Single paragraph of plain text.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            lines: vec![RichLine {
                kind: LineKind::Paragraph,
                spans: vec![Span::Text(text.into())],
            }],
        }
    }

    /// Flatten to the sanitized display string (no markup characters).
    pub fn plain(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            match line.kind {
                LineKind::Bullet => out.push_str("• "),
                LineKind::Numbered(n) => out.push_str(&format!("{}. ", n)),
                LineKind::Paragraph | LineKind::Heading => {}
            }
            for span in &line.spans {
                match span {
                    Span::Text(t) | Span::Bold(t) => out.push_str(t),
                    Span::Link { label, url } => {
                        if label == url {
                            out.push_str(url);
                        } else {
                            out.push_str(&format!("{} ({})", label, url));
                        }
                    }
                }
            }
        }
        out
    }

    /// All embedded URLs, in order of appearance.
    pub fn links(&self) -> Vec<&str> {
        self.lines
            .iter()
            .flat_map(|line| line.spans.iter())
            .filter_map(|span| match span {
                Span::Link { url, .. } => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }
}

//
// ================= Search Results =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Price {
    pub value: f64,
    pub display: String,
}

/// A single normalized search/product result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultItem {
    pub title: String,
    pub snippet: String,
    pub url: String,
    /// Site/platform label
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

//
// ================= Message =================
//

/// One conversational turn.
///
/// Invariant (kept by the constructors): exactly one of
/// `pending_action` / `results` is populated, consistent with `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: MessageRole,
    pub kind: MessageKind,
    /// Display string, already sanitized of raw markup
    pub text: String,
    pub rich: RichText,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_action: Option<PendingAction>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub results: Vec<ResultItem>,
    /// Purely informational greeting, excluded from LLM context
    #[serde(default)]
    pub welcome: bool,
}

impl Message {
    fn base(role: MessageRole, kind: MessageKind, rich: RichText) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            kind,
            text: rich.plain(),
            rich,
            timestamp: Utc::now(),
            pending_action: None,
            results: Vec::new(),
            welcome: false,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::base(
            MessageRole::User,
            MessageKind::Plain,
            RichText::paragraph(text),
        )
    }

    pub fn assistant(rich: RichText) -> Self {
        Self::base(MessageRole::Assistant, MessageKind::Plain, rich)
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::assistant(RichText::paragraph(text))
    }

    pub fn welcome(text: impl Into<String>) -> Self {
        let mut msg = Self::assistant_text(text);
        msg.welcome = true;
        msg
    }

    pub fn result_set(rich: RichText, results: Vec<ResultItem>) -> Self {
        let mut msg = Self::base(MessageRole::Assistant, MessageKind::ResultSet, rich);
        msg.results = results;
        msg
    }

    pub fn pending(action: PendingAction) -> Self {
        let mut msg = Self::base(
            MessageRole::Assistant,
            MessageKind::PendingAction,
            RichText::paragraph(action.confirmation_text.clone()),
        );
        msg.pending_action = Some(action);
        msg
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::base(
            MessageRole::Assistant,
            MessageKind::Success,
            RichText::paragraph(text),
        )
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::base(
            MessageRole::Assistant,
            MessageKind::Error,
            RichText::paragraph(text),
        )
    }
}

/// One role/content pair as passed to the chat layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
}

//
// ================= Persisted Financial Records =================
//
// Created by the data layer as side effects of ActionExecutor; the
// orchestration core only ever sees them as return values.
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub category: String,
    pub period: BudgetPeriod,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub target_amount: f64,
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPaymentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub category: String,
    pub due_date: NaiveDate,
    pub frequency: PaymentFrequency,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub direction: TransactionDirection,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
