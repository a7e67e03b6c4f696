//! Best-effort recovery of JSON from free-form model output.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("response was empty")]
    Empty,
    #[error("response contains no JSON value of the expected shape")]
    NonJson,
    #[error("response was cut off before the closing delimiter")]
    Truncated,
}

/// Recover a JSON array from model output.
pub fn parse_json_array(text: &str) -> Result<Value, ParseError> {
    parse_delimited(text, '[', ']')
}

/// Recover a JSON object from model output.
pub fn parse_json_object(text: &str) -> Result<Value, ParseError> {
    parse_delimited(text, '{', '}')
}

fn parse_delimited(text: &str, open: char, close: char) -> Result<Value, ParseError> {
    let body = strip_fences(text);
    if body.is_empty() {
        return Err(ParseError::Empty);
    }
    let shaped = |v: &Value| match open {
        '[' => v.is_array(),
        _ => v.is_object(),
    };

    if let Ok(value) = serde_json::from_str::<Value>(body)
        && shaped(&value)
    {
        return Ok(value);
    }

    // Prose or a wrapper around the payload: take first opener through last closer.
    let Some(start) = body.find(open) else {
        return Err(ParseError::NonJson);
    };
    let Some(end) = body.rfind(close).filter(|&end| end > start) else {
        return Err(ParseError::Truncated);
    };
    serde_json::from_str::<Value>(&body[start..=end])
        .ok()
        .filter(shaped)
        .ok_or(ParseError::NonJson)
}

/// Trim whitespace and a surrounding Markdown code fence (with optional language tag).
fn strip_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches("json"),
        };
    }
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json() {
        assert_eq!(
            parse_json_array(r#"[{"id": "1"}]"#).unwrap(),
            json!([{"id": "1"}])
        );
        assert_eq!(parse_json_object(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn fenced_json() {
        let text = "```json\n{\"หมวด ๑ บททั่วไป\": \"general\"}\n```";
        assert_eq!(
            parse_json_object(text).unwrap(),
            json!({"หมวด ๑ บททั่วไป": "general"})
        );
        assert_eq!(parse_json_array("```\n[1, 2]\n```").unwrap(), json!([1, 2]));
    }

    #[test]
    fn surrounding_prose() {
        let text = "Here is the mapping:\n{\"a\": \"monarchy\"}\nHope this helps!";
        assert_eq!(parse_json_object(text).unwrap(), json!({"a": "monarchy"}));
    }

    #[test]
    fn array_inside_wrapper_object() {
        let text = r#"{"sections": [{"id": "1", "content": "x"}]}"#;
        assert_eq!(
            parse_json_array(text).unwrap(),
            json!([{"id": "1", "content": "x"}])
        );
    }

    #[test]
    fn named_failures() {
        assert_eq!(parse_json_array("   "), Err(ParseError::Empty));
        assert_eq!(parse_json_array("```json\n```"), Err(ParseError::Empty));
        assert_eq!(parse_json_array("no json here"), Err(ParseError::NonJson));
        assert_eq!(
            parse_json_array(r#"[{"id": "1", "content": "ตัดกลาง"#),
            Err(ParseError::Truncated)
        );
        assert_eq!(parse_json_object("{ not: valid }"), Err(ParseError::NonJson));
    }
}
