//! Intent routing
//!
//! Classifies a raw user message into one of six coarse intents using
//! deterministic keyword matching. No model, no network, no allocation
//! beyond one lowercase pass.

/// Coarse category a user message is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Search,
    Budget,
    Goal,
    Payment,
    Calculation,
    GeneralChat,
}

/// Static keyword lists — zero allocation
///
/// Evaluated in a fixed priority order: shopping queries often contain
/// words like "save" or "budget" incidentally ("save money by buying X"),
/// so the most specific intents are tested first.
const SEARCH_KEYWORDS: &[&str] = &[
    // Explicit search/shopping verbs
    "search", "buy", "purchase", "order", "shop",
    // Price hunting
    "price", "cheapest", "deal", "deals", "discount", "offer",
    // Platform names
    "amazon", "flipkart", "myntra",
];

const BUDGET_KEYWORDS: &[&str] = &[
    "budget", "spending limit", "allocate", "cap my spending",
];

const GOAL_KEYWORDS: &[&str] = &[
    "goal", "save", "saving", "target of",
];

const PAYMENT_KEYWORDS: &[&str] = &[
    "remind", "reminder", "pay", "payment", "bill", "due",
    "emi", "subscription", "recurring", "instalment", "installment",
];

const CALCULATION_KEYWORDS: &[&str] = &[
    "calculate", "how much will", "how much would", "interest",
    "compound", "percentage", "per cent", "returns on",
];

/// Deterministic intent router
pub struct IntentRouter;

impl IntentRouter {
    /// Classify a message. Pure function of the lowercase input string.
    pub fn route(text: &str) -> Intent {
        let lowered = text.to_lowercase();

        let has_any = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

        if has_any(SEARCH_KEYWORDS) {
            Intent::Search
        } else if has_any(BUDGET_KEYWORDS) {
            Intent::Budget
        } else if has_any(GOAL_KEYWORDS) {
            Intent::Goal
        } else if has_any(PAYMENT_KEYWORDS) {
            Intent::Payment
        } else if has_any(CALCULATION_KEYWORDS) {
            Intent::Calculation
        } else {
            Intent::GeneralChat
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_intent() {
        let cases = vec![
            "search for wireless earbuds",
            "buy a phone under 20000",
            "what is the price of iPhone 15 on Flipkart",
            "find deals on Amazon",
        ];

        for c in cases {
            assert_eq!(IntentRouter::route(c), Intent::Search, "case: {}", c);
        }
    }

    #[test]
    fn test_budget_intent() {
        assert_eq!(
            IntentRouter::route("Create a monthly budget of ₹5000 for food"),
            Intent::Budget
        );
        assert_eq!(
            IntentRouter::route("set a spending limit for groceries"),
            Intent::Budget
        );
    }

    #[test]
    fn test_goal_intent() {
        assert_eq!(
            IntentRouter::route("I want to save for a car, around 5 lakh"),
            Intent::Goal
        );
        assert_eq!(
            IntentRouter::route("start a savings goal of 50k"),
            Intent::Goal
        );
    }

    #[test]
    fn test_payment_intent() {
        assert_eq!(
            IntentRouter::route("Remind me to pay 499 for Netflix every month"),
            Intent::Payment
        );
        assert_eq!(
            IntentRouter::route("my electricity bill is due on the 15th"),
            Intent::Payment
        );
    }

    #[test]
    fn test_calculation_intent() {
        assert_eq!(
            IntentRouter::route("calculate interest on 10000 at 7% for 2 years"),
            Intent::Calculation
        );
    }

    #[test]
    fn test_general_chat_fallback() {
        assert_eq!(IntentRouter::route("hello there"), Intent::GeneralChat);
        assert_eq!(
            IntentRouter::route("how am I doing financially?"),
            Intent::GeneralChat
        );
    }

    #[test]
    fn test_priority_search_beats_budget() {
        // "buy" and "budget" in the same message must route to Search.
        assert_eq!(
            IntentRouter::route("save by budgeting my Amazon buys"),
            Intent::Search
        );
        assert_eq!(
            IntentRouter::route("buy groceries within my budget"),
            Intent::Search
        );
    }

    #[test]
    fn test_priority_budget_beats_payment() {
        assert_eq!(
            IntentRouter::route("budget 2000 for bill payments"),
            Intent::Budget
        );
    }
}
