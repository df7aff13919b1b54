//! Repair of garbled JSON text
//!
//! Notebook kernels and REST clients often hand back JSON that was escaped
//! one time too many, quoted as a Python string literal, or had nested
//! objects serialized as strings.

use crate::error::{ParseError, ParseResult};
use serde_json::Value;

/// Undo the usual layers of garbling around a JSON document
pub fn patch_json(data: &str) -> String {
    let mut text = data
        .replace(r#"\\""#, "\"")
        .replace("\"{", "{")
        .replace("}\"", "}")
        .replace(r"\xa0", " ")
        .replace(r"\n", "");

    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        text = text[1..text.len() - 1].to_string();
    }

    text
}

/// Parse JSON text, retrying on the patched text when the raw parse fails
pub fn parse_json_text(text: &str) -> ParseResult<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new("Empty JSON string".to_string(), None));
    }

    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(value),
        Err(raw_err) => {
            let patched = patch_json(trimmed);
            if patched == trimmed {
                return Err(ParseError::from(raw_err).with_preview(preview(trimmed)));
            }
            log::debug!("Raw JSON parse failed ({}), retrying patched text", raw_err);
            serde_json::from_str(patched.trim())
                .map_err(|e| ParseError::from(e).with_preview(preview(&patched)))
        }
    }
}

/// First 80 characters, for log lines
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(80) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
