//! Category vocabularies
//!
//! Fixed keyword tables for budget categories, known billers, and the
//! payment name → category inference used by the payment extractor.

/// keyword → budget category
const BUDGET_CATEGORY_TABLE: &[(&str, &str)] = &[
    ("groceries", "Food"),
    ("grocery", "Food"),
    ("food", "Food"),
    ("dining", "Food"),
    ("restaurant", "Food"),
    ("eating out", "Food"),
    ("fuel", "Transport"),
    ("petrol", "Transport"),
    ("diesel", "Transport"),
    ("transport", "Transport"),
    ("commute", "Transport"),
    ("cab", "Transport"),
    ("uber", "Transport"),
    ("ola", "Transport"),
    ("movie", "Entertainment"),
    ("entertainment", "Entertainment"),
    ("gaming", "Entertainment"),
    ("shopping", "Shopping"),
    ("clothes", "Shopping"),
    ("clothing", "Shopping"),
    ("rent", "Rent"),
    ("electricity", "Utilities"),
    ("water", "Utilities"),
    ("internet", "Utilities"),
    ("wifi", "Utilities"),
    ("broadband", "Utilities"),
    ("utilities", "Utilities"),
    ("utility", "Utilities"),
    ("medical", "Health"),
    ("medicine", "Health"),
    ("health", "Health"),
    ("gym", "Health"),
    ("fitness", "Health"),
    ("tuition", "Education"),
    ("school", "Education"),
    ("course", "Education"),
    ("education", "Education"),
    ("travel", "Travel"),
    ("vacation", "Travel"),
    ("trip", "Travel"),
];

/// Billers recognized when no explicit "for/to <name>" phrase is present.
const KNOWN_BILLERS: &[&str] = &[
    "netflix",
    "spotify",
    "amazon prime",
    "prime video",
    "hotstar",
    "disney",
    "youtube premium",
    "apple music",
    "rent",
    "electricity",
    "water",
    "gas",
    "internet",
    "wifi",
    "broadband",
    "mobile recharge",
    "phone",
    "emi",
    "loan",
    "insurance",
    "gym",
    "school fees",
];

/// payment-name substring → category
const PAYMENT_CATEGORY_TABLE: &[(&str, &str)] = &[
    ("netflix", "Subscriptions"),
    ("spotify", "Subscriptions"),
    ("prime", "Subscriptions"),
    ("hotstar", "Subscriptions"),
    ("disney", "Subscriptions"),
    ("youtube", "Subscriptions"),
    ("apple music", "Subscriptions"),
    ("subscription", "Subscriptions"),
    ("rent", "Rent"),
    ("landlord", "Rent"),
    ("electricity", "Utilities"),
    ("water", "Utilities"),
    ("gas", "Utilities"),
    ("internet", "Utilities"),
    ("wifi", "Utilities"),
    ("broadband", "Utilities"),
    ("phone", "Utilities"),
    ("mobile", "Utilities"),
    ("emi", "EMI"),
    ("loan", "EMI"),
    ("insurance", "Insurance"),
    ("gym", "Health"),
    ("fitness", "Health"),
    ("school", "Education"),
    ("fees", "Education"),
];

/// First matching budget category keyword in the text, else "General".
pub fn budget_category(text_lower: &str) -> String {
    BUDGET_CATEGORY_TABLE
        .iter()
        .find(|(keyword, _)| text_lower.contains(keyword))
        .map(|(_, category)| category.to_string())
        .unwrap_or_else(|| "General".to_string())
}

/// First known biller mentioned in the text, title-cased for display.
pub fn known_biller(text_lower: &str) -> Option<String> {
    KNOWN_BILLERS
        .iter()
        .find(|biller| text_lower.contains(*biller))
        .map(|biller| title_case(biller))
}

/// Category inferred from a payment name, else "Other".
pub fn payment_category(name: &str) -> String {
    let lowered = name.to_lowercase();
    PAYMENT_CATEGORY_TABLE
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, category)| category.to_string())
        .unwrap_or_else(|| "Other".to_string())
}

pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_category_lookup() {
        assert_eq!(budget_category("monthly budget of 5000 for food"), "Food");
        assert_eq!(budget_category("budget for petrol and tolls"), "Transport");
        assert_eq!(budget_category("budget 3000 for stuff"), "General");
    }

    #[test]
    fn test_known_biller() {
        assert_eq!(
            known_biller("remind me about netflix"),
            Some("Netflix".to_string())
        );
        assert_eq!(known_biller("pay something"), None);
    }

    #[test]
    fn test_payment_category_inference() {
        assert_eq!(payment_category("Netflix"), "Subscriptions");
        assert_eq!(payment_category("House Rent"), "Rent");
        assert_eq!(payment_category("Car Loan"), "EMI");
        assert_eq!(payment_category("Milkman"), "Other");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("school fees"), "School Fees");
        assert_eq!(title_case("netflix"), "Netflix");
    }
}
