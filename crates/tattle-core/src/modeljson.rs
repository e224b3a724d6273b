//! Best-effort JSON recovery from model output.
//!
//! Models asked for "a single-line JSON object" routinely wrap it in
//! explanatory prose, markdown fences, or raw control characters. Recovery
//! is an explicit two-attempt parse, not implicit control flow:
//!
//! 1. Parse the full response as JSON.
//! 2. Extract the first-to-last brace-delimited substring, strip control
//!    characters, and parse that.
//!
//! Total failure yields [`ParseOutcome::Malformed`]; callers decide whether
//! that means an empty result (mining) or a templated fallback (publishing).

use serde::de::DeserializeOwned;

/// Tagged result of a recovery attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    Parsed(T),
    Malformed,
}

impl<T> ParseOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            ParseOutcome::Parsed(v) => Some(v),
            ParseOutcome::Malformed => None,
        }
    }
}

/// Recover a `T` from free-form model output.
pub fn recover<T: DeserializeOwned>(text: &str) -> ParseOutcome<T> {
    // First attempt: the whole response is the JSON.
    if let Ok(value) = serde_json::from_str::<T>(text) {
        return ParseOutcome::Parsed(value);
    }

    // Second attempt: brace extraction plus control-character stripping.
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return ParseOutcome::Malformed;
    };
    if end < start {
        return ParseOutcome::Malformed;
    }

    let cleaned: String = text[start..=end]
        .chars()
        .filter(|c| !is_control_char(*c))
        .collect();

    match serde_json::from_str::<T>(&cleaned) {
        Ok(value) => ParseOutcome::Parsed(value),
        Err(err) => {
            tracing::warn!(error = %err, "model output JSON unrecoverable");
            ParseOutcome::Malformed
        }
    }
}

/// C0 controls, DEL, and C1 controls -- the ranges that break
/// `serde_json` when a model emits raw newlines or stray bytes inside
/// what should be a single-line object.
fn is_control_char(c: char) -> bool {
    c < '\u{20}' || ('\u{7f}'..='\u{9f}').contains(&c)
}
