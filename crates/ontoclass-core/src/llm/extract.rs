//! Recover a JSON object from free-text model output.
//!
//! Models wrap their answer in prose or code fences often enough that the
//! response text cannot be parsed directly. The extractor takes the leftmost
//! balanced `{ ... }` span and parses only that.
//!
//! Known limitation: braces inside string values are counted like structural
//! braces, so a value such as `"use {x}"` can shift the span end and make
//! extraction fail. Callers treat that as a malformed answer and retry.

use serde_json::{Map, Value};

/// Extract the first balanced JSON object from `text`.
///
/// Returns `None` when the text has no `{`, when the braces never balance, or
/// when the first balanced span is not valid JSON. No later span is tried.
pub fn extract_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let mut depth: usize = 0;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => continue,
        }

        if depth == 0 {
            let candidate = &text[start..=start + offset];
            return match serde_json::from_str::<Map<String, Value>>(candidate) {
                Ok(object) => Some(object),
                Err(e) => {
                    tracing::debug!("Balanced span is not valid JSON: {e}");
                    None
                }
            };
        }
    }

    None
}
