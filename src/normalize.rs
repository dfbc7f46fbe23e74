//! Response normalization
//!
//! Converts every raw outcome (LLM text, search payloads, staged
//! actions, execution results, errors) into exactly one [`Message`].
//! Display text is sanitized of raw markup, but formatting *semantics*
//! (bold spans, bullet/numbered lines, URLs) survive as structured
//! spans so the UI can render and link them.

use crate::error::OrchestratorError;
use crate::intent::Intent;
use crate::llm::ChatReply;
use crate::models::{
    ExecutionResult, LineKind, Message, Price, ResultItem, RichLine, RichText, Span,
};
use crate::tools::{SearchTool, ToolResponse};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Result lists shown to the user are capped at this many items.
pub const MAX_RESULT_ITEMS: usize = 5;

/// Boilerplate prefixes some models prepend to their answer.
const BOILERPLATE_PREFIXES: &[&str] = &["final answer:", "answer:", "response:"];

static NUMBERED_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)[.)]\s+(.*)$").unwrap());

static INLINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\[([^\]]+)\]\((https?://[^)\s]+)\)|\*\*([^*]+)\*\*|__([^_]+)__|(https?://[^\s<>\])]+)",
    )
    .unwrap()
});

//
// ================= Sanitizer =================
//

/// Strip structural markup into a [`RichText`].
pub fn sanitize(text: &str) -> RichText {
    let mut lines = Vec::new();
    let mut first_content_line = true;

    for raw_line in text.lines() {
        let mut line = raw_line.trim_end();

        // Fence delimiters are dropped; their content stays as plain lines.
        if line.trim_start().starts_with("```") {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        if first_content_line {
            line = strip_boilerplate_prefix(line);
            first_content_line = false;
            if line.trim().is_empty() {
                continue;
            }
        }

        let trimmed = line.trim_start();
        let (kind, content) = if let Some(rest) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
            .or_else(|| trimmed.strip_prefix("• "))
        {
            (LineKind::Bullet, rest)
        } else if let Some(caps) = NUMBERED_LINE_RE.captures(trimmed) {
            let number = caps
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(1);
            // The capture borrows from `trimmed`; re-slice to keep lifetimes simple.
            let rest_start = trimmed.len() - caps.get(2).map(|m| m.as_str().len()).unwrap_or(0);
            (LineKind::Numbered(number), &trimmed[rest_start..])
        } else if let Some(rest) = trimmed.strip_prefix("### ").or_else(|| {
            trimmed
                .strip_prefix("## ")
                .or_else(|| trimmed.strip_prefix("# "))
        }) {
            (LineKind::Heading, rest)
        } else {
            (LineKind::Paragraph, trimmed)
        };

        let spans = parse_spans(content);
        if !spans.is_empty() {
            lines.push(RichLine { kind, spans });
        }
    }

    RichText { lines }
}

fn strip_boilerplate_prefix(line: &str) -> &str {
    let lowered = line.trim_start().to_lowercase();
    for prefix in BOILERPLATE_PREFIXES {
        if lowered.starts_with(prefix) {
            return line.trim_start()[prefix.len()..].trim_start();
        }
    }
    line
}

/// Split one line into Text/Bold/Link spans.
fn parse_spans(content: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut cursor = 0;

    for caps in INLINE_RE.captures_iter(content) {
        let whole = caps.get(0).expect("match always has a whole group");

        if whole.start() > cursor {
            push_text(&mut spans, &content[cursor..whole.start()]);
        }

        if let (Some(label), Some(url)) = (caps.get(1), caps.get(2)) {
            spans.push(Span::Link {
                label: label.as_str().to_string(),
                url: url.as_str().to_string(),
            });
        } else if let Some(bold) = caps.get(3).or_else(|| caps.get(4)) {
            spans.push(Span::Bold(bold.as_str().to_string()));
        } else if let Some(url) = caps.get(5) {
            spans.push(Span::Link {
                label: url.as_str().to_string(),
                url: url.as_str().to_string(),
            });
        }

        cursor = whole.end();
    }

    if cursor < content.len() {
        push_text(&mut spans, &content[cursor..]);
    }

    spans
}

/// Plain segment with stray emphasis/backtick markers removed.
fn push_text(spans: &mut Vec<Span>, segment: &str) {
    let cleaned = segment.replace('*', "").replace('`', "");
    if !cleaned.is_empty() {
        spans.push(Span::Text(cleaned));
    }
}

//
// ================= Search Result Normalization =================
//

/// Payload keys for each search tool, tried in order. Selected by the
/// tool that produced the payload, never by sniffing its shape.
fn payload_keys(tool: SearchTool) -> &'static [&'static str] {
    match tool {
        SearchTool::WebSearch => &["results", "organic_results"],
        SearchTool::Amazon => &["amazon", "products"],
        SearchTool::Flipkart => &["flipkart", "products"],
        SearchTool::Shopping => &["shopping_results", "products"],
    }
}

/// Flatten a tool search payload into at most [`MAX_RESULT_ITEMS`] items.
pub fn normalize_search_results(tool: SearchTool, data: &Value) -> Vec<ResultItem> {
    let list = match data {
        // The contract allows a bare list...
        Value::Array(items) => Some(items),
        // ...or an object keyed by the tool's own payload shape.
        Value::Object(_) => payload_keys(tool)
            .iter()
            .find_map(|key| data.get(*key).and_then(Value::as_array)),
        _ => None,
    };

    list.map(|items| {
        items
            .iter()
            .filter_map(|item| result_item(item, tool.label()))
            .take(MAX_RESULT_ITEMS)
            .collect()
    })
    .unwrap_or_default()
}

fn result_item(value: &Value, fallback_source: &str) -> Option<ResultItem> {
    let title = text_of(value, &["title", "name"])?;

    Some(ResultItem {
        title,
        snippet: text_of(value, &["snippet", "description", "summary"]).unwrap_or_default(),
        url: text_of(value, &["url", "link"]).unwrap_or_default(),
        source: text_of(value, &["source", "site"])
            .unwrap_or_else(|| fallback_source.to_string()),
        price: price_of(value),
        thumbnail: text_of(value, &["thumbnail", "image"]),
    })
}

fn text_of(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn price_of(value: &Value) -> Option<Price> {
    match value.get("price") {
        Some(Value::Number(n)) => {
            let amount = n.as_f64()?;
            Some(Price {
                value: amount,
                display: format!("₹{:.0}", amount),
            })
        }
        Some(Value::String(s)) => {
            let numeric: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            let amount = numeric.parse::<f64>().ok()?;
            Some(Price {
                value: amount,
                display: s.clone(),
            })
        }
        _ => None,
    }
}

//
// ================= Message Builders =================
//

/// Builds the single uniform [`Message`] for every raw outcome.
pub struct ResponseNormalizer;

impl ResponseNormalizer {
    pub fn from_chat(reply: &ChatReply) -> Message {
        let rich = sanitize(&reply.response);

        if reply.sources.is_empty() {
            return Message::assistant(rich);
        }

        let results: Vec<ResultItem> = reply
            .sources
            .iter()
            .take(MAX_RESULT_ITEMS)
            .map(|source| ResultItem {
                title: source.title.clone(),
                snippet: source.snippet.clone(),
                url: source.url.clone(),
                source: "Web".to_string(),
                price: None,
                thumbnail: None,
            })
            .collect();

        Message::result_set(rich, results)
    }

    pub fn from_search(tool: SearchTool, response: &ToolResponse, query: &str) -> Message {
        let items = response
            .data
            .as_ref()
            .map(|data| normalize_search_results(tool, data))
            .unwrap_or_default();

        if items.is_empty() {
            return Message::assistant_text(format!(
                "I couldn't find anything for \"{}\". Try different words?",
                query
            ));
        }

        let rich = RichText::paragraph(format!("Here's what I found for \"{}\":", query));
        Message::result_set(rich, items)
    }

    pub fn from_execution(result: &ExecutionResult) -> Message {
        if result.success {
            Message::success(result.detail.clone())
        } else {
            Message::error(result.detail.clone())
        }
    }

    pub fn from_error(error: &OrchestratorError) -> Message {
        Message::error(error.user_message())
    }

    /// Clarifying prompt for a missing amount, with an example phrasing.
    pub fn clarification(intent: Intent) -> Message {
        let text = match intent {
            Intent::Budget => {
                "I couldn't spot the amount. Try something like: \"Create a monthly budget of ₹5000 for food\"."
            }
            Intent::Goal => {
                "I couldn't spot the amount. Try something like: \"Save 2 lakh for a wedding\"."
            }
            Intent::Payment => {
                "I couldn't spot the amount. Try something like: \"Remind me to pay 499 for Netflix every month\"."
            }
            _ => "Could you rephrase that with an amount? For example: \"budget ₹5000 for food\".",
        };
        Message::assistant_text(text)
    }

    pub fn busy() -> Message {
        Message::assistant_text(
            "I'm still working on your previous message — give me a second.",
        )
    }

    pub fn already_handled() -> Message {
        Message::assistant_text("That action was already handled, so I didn't repeat it.")
    }

    pub fn unknown_action() -> Message {
        Message::error("I couldn't find that action anymore. It may have expired with the session.")
    }

    pub fn cancelled() -> Message {
        Message::assistant_text("Cancelled — nothing was changed.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_strips_bold_markers_but_keeps_span() {
        let rich = sanitize("Your **Food** budget looks healthy.");
        assert_eq!(rich.lines.len(), 1);
        assert!(rich
            .lines[0]
            .spans
            .contains(&Span::Bold("Food".to_string())));
        assert_eq!(rich.plain(), "Your Food budget looks healthy.");
    }

    #[test]
    fn test_sanitize_preserves_urls_as_links() {
        let rich = sanitize("See [RBI rates](https://rbi.org.in/rates) or https://example.com");
        let links = rich.links();
        assert_eq!(links, vec!["https://rbi.org.in/rates", "https://example.com"]);
        // The display string keeps no raw markdown.
        assert!(!rich.plain().contains('['));
    }

    #[test]
    fn test_sanitize_strips_fences_and_boilerplate() {
        let text = "Final Answer: Here's the plan\n```\nsome code\n```\n- step one\n- step two";
        let rich = sanitize(text);

        assert_eq!(rich.plain(), "Here's the plan\nsome code\n• step one\n• step two");
        assert_eq!(rich.lines[2].kind, LineKind::Bullet);
    }

    #[test]
    fn test_sanitize_numbered_lines() {
        let rich = sanitize("1. first\n2) second");
        assert_eq!(rich.lines[0].kind, LineKind::Numbered(1));
        assert_eq!(rich.lines[1].kind, LineKind::Numbered(2));
        assert_eq!(rich.plain(), "1. first\n2. second");
    }

    #[test]
    fn test_web_search_key_selection() {
        let data = json!({
            "organic_results": [
                {"title": "SIP guide", "snippet": "How SIPs work", "url": "https://x.in/sip"}
            ]
        });

        let items = normalize_search_results(SearchTool::WebSearch, &data);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "SIP guide");
        assert_eq!(items[0].source, "Web");
    }

    #[test]
    fn test_amazon_key_not_read_for_web_search() {
        let data = json!({"amazon": [{"title": "Earbuds"}]});
        assert!(normalize_search_results(SearchTool::WebSearch, &data).is_empty());
        assert_eq!(normalize_search_results(SearchTool::Amazon, &data).len(), 1);
    }

    #[test]
    fn test_results_capped_at_five() {
        let items: Vec<Value> = (0..9)
            .map(|i| json!({"title": format!("Item {}", i)}))
            .collect();
        let data = json!({ "shopping_results": items });

        let normalized = normalize_search_results(SearchTool::Shopping, &data);
        assert_eq!(normalized.len(), MAX_RESULT_ITEMS);
    }

    #[test]
    fn test_price_string_parsing() {
        let data = json!({
            "flipkart": [
                {"title": "Shoes", "price": "₹2,499"}
            ]
        });

        let items = normalize_search_results(SearchTool::Flipkart, &data);
        let price = items[0].price.as_ref().unwrap();
        assert_eq!(price.value, 2499.0);
        assert_eq!(price.display, "₹2,499");
    }

    #[test]
    fn test_empty_results_degrade_politely() {
        let response = ToolResponse {
            success: true,
            data: Some(json!({"results": []})),
            ..Default::default()
        };

        let msg = ResponseNormalizer::from_search(SearchTool::WebSearch, &response, "unicorn bonds");
        assert_eq!(msg.kind, crate::models::MessageKind::Plain);
        assert!(msg.text.contains("couldn't find"));
    }

    #[test]
    fn test_clarification_has_example() {
        let msg = ResponseNormalizer::clarification(Intent::Budget);
        assert!(msg.text.contains("₹5000"));
        assert_eq!(msg.kind, crate::models::MessageKind::Plain);
    }
}
