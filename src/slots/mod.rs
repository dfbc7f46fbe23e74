//! Slot extraction
//!
//! Per-intent regex/heuristic extraction of typed parameter records from
//! free text. Deliberately deterministic: each pattern set sits behind a
//! narrow function so a model-based extractor could replace it without
//! touching the turn state machine.
//!
//! Extraction failure (no amount found) yields `None`; callers turn that
//! into a clarifying prompt, never an error.

pub mod amount;
pub mod category;
pub mod date;
pub mod payload;

use crate::models::{BudgetPeriod, PaymentFrequency};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

pub use payload::parse_action_payload;

const DEFAULT_GOAL_NAME: &str = "Savings Goal";

/// Words that end a captured name/goal phrase.
const PHRASE_TRIM_WORDS: &[&str] = &[
    "by", "in", "within", "worth", "of", "around", "about", "before", "costing", "every", "each",
    "on", "at", "monthly", "weekly", "biweekly", "quarterly", "yearly", "per", "starting", "due",
    "bill", "payment",
];

/// Verbs that disqualify a "to <word>" capture as a payee name.
const NAME_STOP_VERBS: &[&str] = &[
    "pay", "buy", "make", "send", "remind", "save", "create", "add", "set", "transfer",
];

static GOAL_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    // An amount may sit between "save" and "for" ("save up 50k for a bike").
    Regex::new(
        r"(?i)\b(?:sav(?:e|ing)\s+(?:up\s+)?(?:(?:₹|rs\.?\s*)?[0-9][0-9,]*(?:\.[0-9]+)?\s*(?:lakhs?|crores?|k)?\s+)?for|goal\s+(?:for|of))\s+(?:a\s+|an\s+|my\s+|the\s+)?([a-zA-Z][a-zA-Z ]*)",
    )
    .unwrap()
});

static FOR_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bfor\s+(?:the\s+|my\s+)?([a-zA-Z][a-zA-Z+ ]*)").unwrap()
});

static TO_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bto\s+(?:the\s+|my\s+)?([a-zA-Z][a-zA-Z+ ]*)").unwrap()
});

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSlots {
    pub amount: f64,
    pub category: String,
    pub period: BudgetPeriod,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalSlots {
    pub amount: f64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSlots {
    pub amount: f64,
    pub name: String,
    pub category: String,
    pub frequency: PaymentFrequency,
    pub due_date: NaiveDate,
}

/// Per-intent slot extractor
pub struct SlotExtractor;

impl SlotExtractor {
    /// Budget: amount, category from the fixed vocabulary, period keyword.
    pub fn budget(text: &str) -> Option<BudgetSlots> {
        let amount = amount::parse_amount(text)?;
        let lowered = text.to_lowercase();

        Some(BudgetSlots {
            amount,
            category: category::budget_category(&lowered),
            period: parse_period(&lowered),
        })
    }

    /// Goal: amount with lakh/k multipliers, name from a "save for <phrase>"
    /// pattern trimmed at the next amount/time keyword.
    pub fn goal(text: &str) -> Option<GoalSlots> {
        let amount = amount::parse_scaled_amount(text)?;

        let name = GOAL_NAME_RE
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| trim_phrase(m.as_str()))
            .filter(|phrase| !phrase.is_empty())
            .map(|phrase| category::title_case(&phrase))
            .unwrap_or_else(|| DEFAULT_GOAL_NAME.to_string());

        Some(GoalSlots { amount, name })
    }

    /// Payment: amount, payee name, inferred category, frequency, due date.
    pub fn payment(text: &str, today: NaiveDate) -> Option<PaymentSlots> {
        let amount = amount::parse_amount(text)?;
        let lowered = text.to_lowercase();

        let name = extract_payee_name(text)
            .or_else(|| category::known_biller(&lowered))
            .unwrap_or_else(|| "Payment".to_string());

        Some(PaymentSlots {
            amount,
            category: category::payment_category(&name),
            name,
            frequency: parse_frequency(&lowered),
            due_date: date::due_date_from_text(text, today),
        })
    }
}

/// "for <name>" first, then "to <name>" guarded against verb captures.
fn extract_payee_name(text: &str) -> Option<String> {
    let candidate = |re: &Regex| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| trim_phrase(m.as_str()))
            .filter(|phrase| {
                !phrase.is_empty() && !NAME_STOP_VERBS.contains(&phrase.to_lowercase().as_str())
            })
    };

    candidate(&FOR_NAME_RE)
        .or_else(|| candidate(&TO_NAME_RE))
        .map(|phrase| category::title_case(&phrase))
}

/// Accumulate words until an amount-like token or trim keyword appears.
fn trim_phrase(phrase: &str) -> String {
    let mut kept = Vec::new();

    for word in phrase.split_whitespace() {
        let lowered = word.to_lowercase();
        if word.starts_with(|c: char| c.is_ascii_digit() || c == '₹')
            || PHRASE_TRIM_WORDS.contains(&lowered.as_str())
        {
            break;
        }
        kept.push(word);
    }

    kept.join(" ")
}

pub fn parse_period(text_lower: &str) -> BudgetPeriod {
    if text_lower.contains("weekly") || text_lower.contains("per week") || text_lower.contains("every week") {
        BudgetPeriod::Weekly
    } else if text_lower.contains("yearly")
        || text_lower.contains("annual")
        || text_lower.contains("per year")
        || text_lower.contains("every year")
    {
        BudgetPeriod::Yearly
    } else {
        BudgetPeriod::Monthly
    }
}

pub fn parse_frequency(text_lower: &str) -> PaymentFrequency {
    // "biweekly" contains "weekly", so it has to be tested first.
    if text_lower.contains("biweekly")
        || text_lower.contains("bi-weekly")
        || text_lower.contains("fortnight")
        || text_lower.contains("every two weeks")
    {
        PaymentFrequency::Biweekly
    } else if text_lower.contains("weekly") || text_lower.contains("every week") {
        PaymentFrequency::Weekly
    } else if text_lower.contains("quarterly")
        || text_lower.contains("every quarter")
        || text_lower.contains("every 3 months")
    {
        PaymentFrequency::Quarterly
    } else if text_lower.contains("yearly")
        || text_lower.contains("annually")
        || text_lower.contains("annual")
        || text_lower.contains("every year")
    {
        PaymentFrequency::Yearly
    } else {
        PaymentFrequency::Monthly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn test_budget_scenario() {
        let slots = SlotExtractor::budget("Create a monthly budget of ₹5000 for food").unwrap();
        assert_eq!(slots.amount, 5000.0);
        assert_eq!(slots.category, "Food");
        assert_eq!(slots.period, BudgetPeriod::Monthly);
    }

    #[test]
    fn test_budget_period_keywords() {
        let slots = SlotExtractor::budget("weekly budget of 2000 for groceries").unwrap();
        assert_eq!(slots.period, BudgetPeriod::Weekly);
        assert_eq!(slots.category, "Food");

        let slots = SlotExtractor::budget("yearly travel budget of 60000").unwrap();
        assert_eq!(slots.period, BudgetPeriod::Yearly);
        assert_eq!(slots.category, "Travel");
    }

    #[test]
    fn test_budget_without_amount_is_none() {
        assert!(SlotExtractor::budget("create a budget for food").is_none());
    }

    #[test]
    fn test_goal_with_lakh() {
        let slots = SlotExtractor::goal("I want to save for a car, around 5 lakh").unwrap();
        assert_eq!(slots.amount, 500_000.0);
        assert_eq!(slots.name, "Car");
    }

    #[test]
    fn test_goal_with_k_suffix() {
        let slots = SlotExtractor::goal("save up 50k for a new phone").unwrap();
        assert_eq!(slots.amount, 50_000.0);
        assert_eq!(slots.name, "New Phone");
    }

    #[test]
    fn test_goal_name_trimmed_at_amount() {
        let slots = SlotExtractor::goal("goal for wedding 2 lakh by December").unwrap();
        assert_eq!(slots.name, "Wedding");
        assert_eq!(slots.amount, 200_000.0);
    }

    #[test]
    fn test_goal_default_name() {
        let slots = SlotExtractor::goal("I should save 10000").unwrap();
        assert_eq!(slots.name, "Savings Goal");
    }

    #[test]
    fn test_payment_netflix_scenario() {
        let slots =
            SlotExtractor::payment("Remind me to pay 499 for Netflix every month", today())
                .unwrap();
        assert_eq!(slots.amount, 499.0);
        assert_eq!(slots.name, "Netflix");
        assert_eq!(slots.category, "Subscriptions");
        assert_eq!(slots.frequency, PaymentFrequency::Monthly);
        // No day-of-month present → one week out.
        assert_eq!(slots.due_date, NaiveDate::from_ymd_opt(2026, 8, 14).unwrap());
    }

    #[test]
    fn test_payment_biller_fallback() {
        let slots = SlotExtractor::payment("pay 15000 rent on the 1st", today()).unwrap();
        assert_eq!(slots.name, "Rent");
        assert_eq!(slots.category, "Rent");
        assert_eq!(slots.due_date, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
    }

    #[test]
    fn test_payment_frequency_keywords() {
        let slots = SlotExtractor::payment("pay 300 for gym every week", today()).unwrap();
        assert_eq!(slots.frequency, PaymentFrequency::Weekly);

        let slots = SlotExtractor::payment("pay 1200 for insurance quarterly", today()).unwrap();
        assert_eq!(slots.frequency, PaymentFrequency::Quarterly);
    }

    #[test]
    fn test_payment_explicit_date() {
        let slots = SlotExtractor::payment("pay 2500 for broadband on 20/08/2026", today()).unwrap();
        assert_eq!(slots.due_date, NaiveDate::from_ymd_opt(2026, 8, 20).unwrap());
    }

    #[test]
    fn test_payment_without_amount_is_none() {
        assert!(SlotExtractor::payment("remind me to pay the bill", today()).is_none());
    }
}
