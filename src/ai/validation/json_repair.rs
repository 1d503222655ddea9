//! JSON Repair Mechanism
//!
//! Recovers the architecture object from model output. Handles:
//! - Markdown code fence wrapping (```json ... ```)
//! - Trailing commas
//! - Missing closing braces/brackets
//! - Truncated strings
//! - JSON embedded in explanatory text

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Model text that could not be turned into JSON
#[derive(Debug, Clone, Error)]
#[error("{reason} (response starts with: {preview:?})")]
pub struct RepairError {
    pub reason: String,
    pub preview: String,
}

/// Extract and parse JSON from an LLM response
pub fn extract_json_from_response(content: &str) -> Result<Value, RepairError> {
    JsonRepairer::new()
        .parse_or_repair(content)
        .map(|(value, _)| value)
}

/// JSON repair strategies
#[derive(Debug, Clone)]
pub struct JsonRepairer {
    max_repair_attempts: usize,
}

impl Default for JsonRepairer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRepairer {
    pub fn new() -> Self {
        Self {
            max_repair_attempts: 2,
        }
    }

    /// Parse JSON, attempting repair if the initial parse fails.
    ///
    /// Returns (value, was_repaired)
    pub fn parse_or_repair(&self, raw: &str) -> Result<(Value, bool), RepairError> {
        let cleaned = preprocess(raw);
        if cleaned.is_empty() {
            return Err(RepairError {
                reason: "empty response".to_string(),
                preview: String::new(),
            });
        }

        let first_error = match serde_json::from_str::<Value>(&cleaned) {
            Ok(value) => return Ok((value, false)),
            Err(e) => e.to_string(),
        };

        // Prose around an otherwise intact object is the most common case
        if let Some(extracted) = extract_json_from_mixed(&cleaned)
            && let Ok(value) = serde_json::from_str::<Value>(&extracted)
        {
            debug!("JSON extracted from mixed content");
            return Ok((value, true));
        }

        let start = cleaned.find(['{', '[']).unwrap_or(0);
        let candidate = &cleaned[start..];
        for level in 1..=self.max_repair_attempts {
            let repaired = repair_attempt(candidate, level);
            if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
                debug!(level, "JSON repaired");
                return Ok((value, true));
            }
        }

        Err(RepairError {
            reason: first_error,
            preview: cleaned.chars().take(120).collect(),
        })
    }
}

fn preprocess(raw: &str) -> String {
    let s = raw.trim().trim_start_matches('\u{feff}');
    strip_code_fences(s).trim().to_string()
}

/// Strip a surrounding ```json ... ``` fence, or the first fenced block
/// found inside surrounding prose.
fn strip_code_fences(s: &str) -> &str {
    let Some(open) = s.find("```") else {
        return s;
    };
    let after_open = &s[open + 3..];
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(after_open.len());
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => &body[..close],
        // Truncated output: keep everything after the opening fence
        None => body,
    }
}

fn repair_attempt(s: &str, level: usize) -> String {
    let mut result = fix_trailing_commas(s);
    if level >= 2 {
        result = fix_truncated_strings(&result);
        result = fix_trailing_commas(&result);
    }
    balance_brackets(&result)
}

/// Fix trailing commas before ] or }
fn fix_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escape = false;

    for (i, &ch) in chars.iter().enumerate() {
        if escape {
            escape = false;
            result.push(ch);
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            ',' if !in_string => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, Some(']') | Some('}') | None) {
                    continue;
                }
            }
            _ => {}
        }
        result.push(ch);
    }
    result
}

/// Close an open string and append missing closers in nesting order
fn balance_brackets(s: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for ch in s.chars() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => stack.push('}'),
            '[' if !in_string => stack.push(']'),
            '}' | ']' if !in_string => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut result = s.trim_end().to_string();
    if in_string {
        result.push('"');
    }
    while let Some(closer) = stack.pop() {
        result.push(closer);
    }
    result
}

/// Close strings left open at a line break
fn fix_truncated_strings(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    let mut in_string = false;
    let mut escape = false;

    for ch in s.chars() {
        if escape {
            escape = false;
            result.push(ch);
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '\n' | '\r' if in_string => {
                result.push('"');
                in_string = false;
            }
            _ => {}
        }
        result.push(ch);
    }
    result
}

/// Extract the first balanced object or array from surrounding prose
fn extract_json_from_mixed(s: &str) -> Option<String> {
    let start = s.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, ch) in s[start..].char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(s[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_json() {
        let (_, repaired) = JsonRepairer::new()
            .parse_or_repair(r#"{"key": "value"}"#)
            .unwrap();
        assert!(!repaired);
    }

    #[test]
    fn test_strip_code_fences() {
        let input = "```json\n{\"components\": []}\n```";
        let value = extract_json_from_response(input).unwrap();
        assert!(value["components"].is_array());
    }

    #[test]
    fn test_fence_inside_prose() {
        let input = "Here is the architecture:\n```json\n{\"a\": 1}\n```\nLet me know!";
        assert_eq!(extract_json_from_response(input).unwrap()["a"], 1);
    }

    #[test]
    fn test_fix_trailing_comma() {
        let input = r#"{"components": [{"name": "api"},],}"#;
        let (value, repaired) = JsonRepairer::new().parse_or_repair(input).unwrap();
        assert!(repaired);
        assert_eq!(value["components"][0]["name"], "api");
    }

    #[test]
    fn test_comma_inside_string_kept() {
        assert_eq!(fix_trailing_commas(r#"{"a": "x,}"}"#), r#"{"a": "x,}"}"#);
    }

    #[test]
    fn test_balance_brackets_in_order() {
        let input = r#"{"components": [{"name": "api"}"#;
        let (value, repaired) = JsonRepairer::new().parse_or_repair(input).unwrap();
        assert!(repaired);
        assert!(value["components"].is_array());
    }

    #[test]
    fn test_extract_from_mixed() {
        let input = "Sure!\n{\"connections\": []}\nHope this helps!";
        let (value, repaired) = JsonRepairer::new().parse_or_repair(input).unwrap();
        assert!(repaired);
        assert!(value["connections"].is_array());
    }

    #[test]
    fn test_truncated_output() {
        let input = "```json\n{\"components\": [{\"name\": \"Web";
        let value = extract_json_from_response(input).unwrap();
        assert_eq!(value["components"][0]["name"], "Web");
    }

    #[test]
    fn test_prose_only_fails() {
        let err = extract_json_from_response("I cannot help with that.").unwrap_err();
        assert!(err.preview.starts_with("I cannot"));
        assert!(extract_json_from_response("   ").is_err());
    }
}
