//! Amount parsing
//!
//! Pulls the first monetary amount out of free text. Accepts currency
//! prefixes (₹, Rs, INR), Indian comma grouping, and the "lakh"/"crore"/"k"
//! unit suffixes used for goal-style amounts.

use once_cell::sync::Lazy;
use regex::Regex;

static AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9][0-9,]*(?:\.[0-9]+)?)").unwrap());

static SCALED_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([0-9][0-9,]*(?:\.[0-9]+)?)\s*(lakhs?|crores?|k)\b").unwrap()
});

fn parse_numeric(token: &str) -> Option<f64> {
    token.replace(',', "").parse::<f64>().ok()
}

/// First numeric token in the text, commas stripped. Currency symbols are
/// irrelevant to the value and simply not part of the match.
pub fn parse_amount(text: &str) -> Option<f64> {
    let caps = AMOUNT_RE.captures(text)?;
    parse_numeric(caps.get(1)?.as_str())
}

/// Amount with unit multipliers applied ("5 lakh" is 500000, "50k" is 50000).
///
/// The multiplier is applied only when the suffix is actually present;
/// otherwise this behaves exactly like [`parse_amount`].
pub fn parse_scaled_amount(text: &str) -> Option<f64> {
    if let Some(caps) = SCALED_AMOUNT_RE.captures(text) {
        let base = parse_numeric(caps.get(1)?.as_str())?;
        let multiplier = match caps.get(2)?.as_str().to_lowercase().as_str() {
            "lakh" | "lakhs" => 100_000.0,
            "crore" | "crores" => 10_000_000.0,
            "k" => 1_000.0,
            _ => 1.0,
        };
        return Some(base * multiplier);
    }

    parse_amount(text)
}
