//! Due-date computation for scheduled payments
//!
//! Given today's date and a target day-of-month, the next due date is
//! this month's occurrence if it hasn't passed yet, otherwise next
//! month's, clamped to the target month's last day. All functions are
//! pure; `today` is injected so results are deterministic.

use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Days out when no day or date is present in the text at all.
const DEFAULT_DUE_DAYS: i64 = 7;

static EXPLICIT_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([0-3]?\d)/([01]?\d)/(\d{4})\b").unwrap());

static ORDINAL_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([0-3]?\d)\s*(?:st|nd|rd|th)\b").unwrap());

static ON_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bon\s+(?:the\s+)?([0-3]?\d)\b").unwrap());

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Build a date in (year, month), clamping `day` to the month's last day.
pub fn clamp_to_month(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.max(1).min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).expect("clamped day is always valid")
}

/// Next occurrence of day-of-month `day`, relative to `today`.
pub fn next_due_date(today: NaiveDate, day: u32) -> NaiveDate {
    let day = day.clamp(1, 31);

    if day > today.day() {
        clamp_to_month(today.year(), today.month(), day)
    } else {
        let (year, month) = if today.month() == 12 {
            (today.year() + 1, 1)
        } else {
            (today.year(), today.month() + 1)
        };
        clamp_to_month(year, month, day)
    }
}

pub fn default_due_date(today: NaiveDate) -> NaiveDate {
    today + Duration::days(DEFAULT_DUE_DAYS)
}

/// Explicit dd/mm/yyyy date, validated against the calendar.
pub fn parse_explicit_date(text: &str) -> Option<NaiveDate> {
    let caps = EXPLICIT_DATE_RE.captures(text)?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let year: i32 = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Bare day-of-month: "on 15", "on the 15th", "15th".
pub fn parse_day_of_month(text: &str) -> Option<u32> {
    let day: u32 = ORDINAL_DAY_RE
        .captures(text)
        .or_else(|| ON_DAY_RE.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())?;

    (1..=31).contains(&day).then_some(day)
}

/// Resolve a due date from free text: explicit date first, then bare
/// day-of-month, then the default window.
pub fn due_date_from_text(text: &str, today: NaiveDate) -> NaiveDate {
    if let Some(date) = parse_explicit_date(text) {
        return date;
    }
    if let Some(day) = parse_day_of_month(text) {
        return next_due_date(today, day);
    }
    default_due_date(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_ahead_stays_in_current_month() {
        assert_eq!(next_due_date(date(2026, 8, 7), 15), date(2026, 8, 15));
    }

    #[test]
    fn test_day_passed_rolls_to_next_month() {
        assert_eq!(next_due_date(date(2026, 8, 20), 15), date(2026, 9, 15));
        // The target day counting as "occurred" today also rolls over.
        assert_eq!(next_due_date(date(2026, 8, 15), 15), date(2026, 9, 15));
    }

    #[test]
    fn test_december_rollover() {
        assert_eq!(next_due_date(date(2026, 12, 20), 5), date(2027, 1, 5));
    }

    #[test]
    fn test_clamp_day_31_in_short_months() {
        // September has 30 days.
        assert_eq!(next_due_date(date(2026, 8, 31), 31), date(2026, 9, 30));
        // February, non-leap and leap.
        assert_eq!(next_due_date(date(2026, 1, 31), 31), date(2026, 2, 28));
        assert_eq!(next_due_date(date(2028, 1, 31), 31), date(2028, 2, 29));
    }

    #[test]
    fn test_idempotent_for_fixed_today() {
        let today = date(2026, 8, 7);
        let first = next_due_date(today, 31);
        let second = next_due_date(today, 31);
        assert_eq!(first, second);
    }

    #[test]
    fn test_explicit_date_wins() {
        let today = date(2026, 8, 7);
        assert_eq!(
            due_date_from_text("pay rent on 01/09/2026", today),
            date(2026, 9, 1)
        );
    }

    #[test]
    fn test_invalid_explicit_date_falls_through() {
        let today = date(2026, 8, 7);
        // 31/02 is not a real date; the bare day heuristic takes over
        // and "31" is treated as a day-of-month.
        assert_eq!(
            due_date_from_text("pay on 31/02/2026", today),
            date(2026, 8, 31)
        );
    }

    #[test]
    fn test_ordinal_and_on_forms() {
        let today = date(2026, 8, 7);
        assert_eq!(
            due_date_from_text("electricity bill on the 15th", today),
            date(2026, 8, 15)
        );
        assert_eq!(due_date_from_text("rent due on 2", today), date(2026, 9, 2));
    }

    #[test]
    fn test_no_day_defaults_to_a_week_out() {
        let today = date(2026, 8, 7);
        assert_eq!(
            due_date_from_text("pay 499 for Netflix every month", today),
            date(2026, 8, 14)
        );
    }
}
