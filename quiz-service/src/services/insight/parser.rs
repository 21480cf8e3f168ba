//! Tolerant parsing of model replies.

use super::{Insight, InsightError};
use serde_json::{Map, Value};

/// Returns the end index (exclusive) of the balanced object opening at
/// `start`, ignoring braces inside string literals.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// First balanced `{...}` span in `text` that parses as a JSON object.
///
/// Each opening brace is tried in turn, so stray braces in surrounding prose
/// do not hide a valid object that follows them.
pub fn extract_first_json_object(text: &str) -> Option<Map<String, Value>> {
    let bytes = text.as_bytes();

    for (start, _) in text.match_indices('{') {
        let Some(end) = balanced_end(bytes, start) else {
            continue;
        };
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text[start..end]) {
            return Some(map);
        }
    }

    None
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a reply into an [`Insight`]. Each missing, empty or non-string
/// field becomes `None`; a reply with none of the three fields is an error.
pub fn parse_insight(text: &str) -> Result<Insight, InsightError> {
    let map = extract_first_json_object(text).ok_or(InsightError::NoJson)?;

    let insight = Insight {
        what_this_means: text_field(&map, "whatThisMeans"),
        what_to_do: text_field(&map, "whatToDo"),
        closing_message: text_field(&map, "closingMessage"),
    };

    if insight.is_empty() {
        return Err(InsightError::MissingFields);
    }

    Ok(insight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_wrapped_in_prose() {
        let reply = r#"Here you go:
{"whatThisMeans": "Your system is on alert.", "whatToDo": "Go slowly.", "closingMessage": "Check your inbox."}
Hope that helps!"#;

        let insight = parse_insight(reply).unwrap();

        assert_eq!(insight.what_this_means.as_deref(), Some("Your system is on alert."));
        assert_eq!(insight.what_to_do.as_deref(), Some("Go slowly."));
        assert_eq!(insight.closing_message.as_deref(), Some("Check your inbox."));
    }

    #[test]
    fn braces_inside_strings_do_not_end_the_object() {
        let reply = r#"{"whatThisMeans": "curly } brace and \"quote {\"", "whatToDo": "x"}"#;

        let insight = parse_insight(reply).unwrap();

        assert_eq!(
            insight.what_this_means.as_deref(),
            Some("curly } brace and \"quote {\"")
        );
    }

    #[test]
    fn skips_stray_brace_before_real_object() {
        let reply = r#"Note {not json} then {"whatToDo": "Rest."}"#;

        let insight = parse_insight(reply).unwrap();

        assert_eq!(insight.what_to_do.as_deref(), Some("Rest."));
        assert_eq!(insight.what_this_means, None);
    }

    #[test]
    fn missing_field_becomes_none() {
        let reply = r#"{"whatThisMeans": "A", "whatToDo": "B"}"#;

        let insight = parse_insight(reply).unwrap();

        assert_eq!(insight.closing_message, None);
    }

    #[test]
    fn empty_and_non_string_fields_become_none() {
        let reply = r#"{"whatThisMeans": "  ", "whatToDo": 42, "closingMessage": "C"}"#;

        let insight = parse_insight(reply).unwrap();

        assert_eq!(insight.what_this_means, None);
        assert_eq!(insight.what_to_do, None);
        assert_eq!(insight.closing_message.as_deref(), Some("C"));
    }

    #[test]
    fn prose_without_json_is_an_error() {
        assert!(matches!(
            parse_insight("I can't help with that."),
            Err(InsightError::NoJson)
        ));
        assert!(matches!(
            parse_insight(r#"{"unrelated": true}"#),
            Err(InsightError::MissingFields)
        ));
    }

    #[test]
    fn unbalanced_object_is_not_extracted() {
        assert!(extract_first_json_object(r#"{"whatThisMeans": "A""#).is_none());
    }
}
