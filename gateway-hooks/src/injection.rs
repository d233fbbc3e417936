//! The only sanctioned primitives for mutating message payloads.
//!
//! Both functions are total: they never panic and always report what
//! happened via a reason code instead of throwing.

use gateway_protocol::TextPart;

pub const TRUNCATION_MARKER: &str = "Content truncated due to context window limit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionOutcome {
    Injected,
    NoTextPart,
}

/// Prepend `prefix` to the first text part in `parts`, applying `max_chars`
/// truncation to the prefix before it is joined with the original text.
/// Returns the (possibly truncated) prefix actually applied.
pub fn inject_text_prefix(parts: &mut [TextPart], prefix: &str, max_chars: usize) -> (InjectionOutcome, String) {
    let Some(part) = parts.iter_mut().find(|p| p.kind == "text") else {
        return (InjectionOutcome::NoTextPart, String::new());
    };
    let truncated = truncate_with_marker(prefix, max_chars);
    part.text = format!("{truncated}\n\n---\n\n{}", part.text);
    (InjectionOutcome::Injected, truncated)
}

/// Insert a synthetic text part at index 0 of the last `role="user"`
/// message's `parts` array inside a transform payload.
pub fn insert_synthetic_user_part(
    messages: &mut serde_json::Value,
    text: &str,
    max_chars: usize,
) -> (InjectionOutcome, String) {
    let truncated = truncate_with_marker(text, max_chars);
    let Some(array) = messages.as_array_mut() else {
        return (InjectionOutcome::NoTextPart, truncated);
    };
    let Some(message) = array.iter_mut().rev().find(|m| {
        m.get("info")
            .and_then(|i| i.get("role"))
            .and_then(|r| r.as_str())
            == Some("user")
    }) else {
        return (InjectionOutcome::NoTextPart, truncated);
    };
    let Some(parts) = message.get_mut("parts").and_then(|p| p.as_array_mut()) else {
        return (InjectionOutcome::NoTextPart, truncated);
    };
    let synthetic = serde_json::to_value(TextPart::synthetic(truncated.clone()))
        .unwrap_or_else(|_| serde_json::json!({"type": "text", "text": truncated, "synthetic": true}));
    parts.insert(0, synthetic);
    (InjectionOutcome::Injected, truncated)
}

/// Truncate `text` to exactly `max_chars` characters, appending the
/// truncation marker inside that budget when truncation occurs.
pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        return text.to_string();
    }
    if max_chars <= TRUNCATION_MARKER.chars().count() {
        return TRUNCATION_MARKER.chars().take(max_chars).collect();
    }
    let keep = max_chars - TRUNCATION_MARKER.chars().count();
    let head: String = text.chars().take(keep).collect();
    format!("{head}{TRUNCATION_MARKER}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inject_text_prefix_prepends_to_first_text_part() {
        let mut parts = vec![TextPart::text("Original prompt")];
        let (outcome, _) = inject_text_prefix(&mut parts, "Injected context", 1000);
        assert_eq!(outcome, InjectionOutcome::Injected);
        assert_eq!(parts[0].text, "Injected context\n\n---\n\nOriginal prompt");
    }

    #[test]
    fn inject_text_prefix_reports_missing_text_part() {
        let mut parts: Vec<TextPart> = vec![];
        let (outcome, _) = inject_text_prefix(&mut parts, "Injected context", 1000);
        assert_eq!(outcome, InjectionOutcome::NoTextPart);
    }

    #[test]
    fn truncation_applies_marker_within_budget() {
        let text = "X".repeat(220);
        let truncated = truncate_with_marker(&text, 120);
        assert_eq!(truncated.chars().count(), 120);
        assert!(truncated.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn insert_synthetic_user_part_targets_last_user_message() {
        let mut messages = serde_json::json!([
            {"info": {"role": "assistant"}, "parts": []},
            {"info": {"role": "user"}, "parts": [{"type": "text", "text": "hi"}]},
        ]);
        let (outcome, _) = insert_synthetic_user_part(&mut messages, "merged context", 1000);
        assert_eq!(outcome, InjectionOutcome::Injected);
        let parts = messages[1]["parts"].as_array().unwrap();
        assert_eq!(parts[0]["synthetic"], serde_json::json!(true));
        assert_eq!(parts[0]["text"], "merged context");
    }

    #[test]
    fn insert_synthetic_user_part_no_user_message_reports_failure() {
        let mut messages = serde_json::json!([{"info": {"role": "assistant"}, "parts": []}]);
        let (outcome, _) = insert_synthetic_user_part(&mut messages, "merged context", 1000);
        assert_eq!(outcome, InjectionOutcome::NoTextPart);
    }
}
