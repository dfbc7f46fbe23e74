//! Action payload parsing
//!
//! The chat layer can propose an action itself (`needs_confirmation` plus
//! an `action_type`/`action_data` pair). This module turns that untyped
//! map into the same [`ActionParams`] union the slot extractor produces,
//! applying the fixed defaults for anything the payload omitted.

use crate::error::{OrchestratorError, Result};
use crate::models::{ActionKind, ActionParams, TransactionDirection};
use crate::slots::{category, date, parse_frequency, parse_period};
use chrono::NaiveDate;
use serde_json::Value;

/// Parse a tool/LLM action payload into typed parameters.
///
/// Unknown action types are an explicit error, never silently ignored.
pub fn parse_action_payload(
    action_type: &str,
    action_data: Option<&Value>,
    today: NaiveDate,
) -> Result<ActionParams> {
    let kind = ActionKind::parse(action_type)
        .ok_or_else(|| OrchestratorError::UnknownAction(action_type.to_string()))?;

    let empty = Value::Object(Default::default());
    let data = action_data.unwrap_or(&empty);

    let params = match kind {
        ActionKind::CreateBudget => {
            let amount = require_amount(data, &["amount", "limit"])?;
            let category = text_field(data, &["category"])
                .unwrap_or_else(|| "General".to_string());
            ActionParams::CreateBudget {
                name: text_field(data, &["name"]).unwrap_or_else(|| category.clone()),
                amount,
                category,
                period: text_field(data, &["period"])
                    .map(|p| parse_period(&p.to_lowercase()))
                    .unwrap_or_default(),
            }
        }
        ActionKind::CreateSavingsGoal => ActionParams::CreateSavingsGoal {
            name: text_field(data, &["name", "goal_name"])
                .unwrap_or_else(|| "Savings Goal".to_string()),
            target_amount: require_amount(data, &["target_amount", "amount", "target"])?,
            deadline: date_field(data, &["deadline", "target_date"]),
        },
        ActionKind::CreateScheduledPayment => {
            let name = text_field(data, &["name", "payee"]).unwrap_or_else(|| "Payment".to_string());
            ActionParams::CreateScheduledPayment {
                amount: require_amount(data, &["amount"])?,
                category: text_field(data, &["category"])
                    .unwrap_or_else(|| category::payment_category(&name)),
                name,
                due_date: date_field(data, &["due_date", "date"])
                    .unwrap_or_else(|| date::default_due_date(today)),
                frequency: text_field(data, &["frequency"])
                    .map(|f| parse_frequency(&f.to_lowercase()))
                    .unwrap_or_default(),
            }
        }
        ActionKind::AddTransaction => ActionParams::AddTransaction {
            description: text_field(data, &["description", "name"])
                .unwrap_or_else(|| "Transaction".to_string()),
            amount: require_amount(data, &["amount"])?,
            category: text_field(data, &["category"]).unwrap_or_else(|| "Other".to_string()),
            direction: direction_field(data),
            date: date_field(data, &["date"]),
        },
    };

    Ok(params)
}

fn require_amount(data: &Value, keys: &[&str]) -> Result<f64> {
    amount_field(data, keys).ok_or_else(|| {
        OrchestratorError::MalformedResponse("action payload is missing an amount".to_string())
    })
}

/// Numbers may arrive as JSON numbers or as numeric strings ("12,500").
fn amount_field(data: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        match data.get(key) {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) => {
                if let Ok(parsed) = s.replace(',', "").replace('₹', "").trim().parse::<f64>() {
                    return Some(parsed);
                }
            }
            _ => {}
        }
    }
    None
}

fn text_field(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| data.get(*key).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn date_field(data: &Value, keys: &[&str]) -> Option<NaiveDate> {
    let raw = keys
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_str))?;

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

fn direction_field(data: &Value) -> TransactionDirection {
    let raw = data
        .get("type")
        .or_else(|| data.get("direction"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();

    if raw.contains("income") || raw.contains("credit") {
        TransactionDirection::Income
    } else {
        TransactionDirection::Expense
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetPeriod, PaymentFrequency};
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn test_budget_payload() {
        let data = json!({"amount": 5000, "category": "Food", "period": "monthly"});
        let params = parse_action_payload("create_budget", Some(&data), today()).unwrap();

        match params {
            ActionParams::CreateBudget {
                name,
                amount,
                category,
                period,
            } => {
                assert_eq!(name, "Food");
                assert_eq!(amount, 5000.0);
                assert_eq!(category, "Food");
                assert_eq!(period, BudgetPeriod::Monthly);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_payment_payload_defaults() {
        let data = json!({"amount": "499", "name": "Netflix"});
        let params =
            parse_action_payload("create_scheduled_payment", Some(&data), today()).unwrap();

        match params {
            ActionParams::CreateScheduledPayment {
                name,
                amount,
                category,
                due_date,
                frequency,
            } => {
                assert_eq!(name, "Netflix");
                assert_eq!(amount, 499.0);
                assert_eq!(category, "Subscriptions");
                assert_eq!(due_date, NaiveDate::from_ymd_opt(2026, 8, 14).unwrap());
                assert_eq!(frequency, PaymentFrequency::Monthly);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_action_type() {
        let err = parse_action_payload("delete_everything", None, today()).unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownAction(_)));
    }

    #[test]
    fn test_missing_amount_is_malformed() {
        let data = json!({"category": "Food"});
        let err = parse_action_payload("create_budget", Some(&data), today()).unwrap_err();
        assert!(matches!(err, OrchestratorError::MalformedResponse(_)));
    }

    #[test]
    fn test_transaction_direction() {
        let data = json!({"amount": 1200, "description": "Salary bonus", "type": "income"});
        let params = parse_action_payload("add_transaction", Some(&data), today()).unwrap();

        match params {
            ActionParams::AddTransaction { direction, .. } => {
                assert_eq!(direction, TransactionDirection::Income);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }
}
