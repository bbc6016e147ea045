// Structured-output extraction from free-text model responses.
//
// `extract` finds the outermost balanced object in the raw text, parses it
// with the tolerant literal parser (retrying once after the unicode
// pre-clean) and returns the value. Anything unrecoverable becomes the
// empty object `{}` plus a warning: one malformed response must never
// abort a batch.

pub mod braces;
pub mod clean;
pub mod literal;
pub mod mapping;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::output::truncate_chars;

/// Why a response could not be recovered. Logged, never returned.
#[derive(Debug, Error)]
enum ExtractionFailure {
    #[error("no balanced object in response")]
    NoPayload,

    #[error("payload did not parse: {0}")]
    Parse(#[from] literal::LiteralError),

    #[error("payload has unexpected shape: {0}")]
    Shape(String),
}

/// The empty sentinel returned for unrecoverable input.
pub fn empty_value() -> Value {
    Value::Object(Map::new())
}

pub fn is_empty_value(value: &Value) -> bool {
    value.as_object().is_some_and(Map::is_empty)
}

/// Recover the object embedded in `raw_text`, or `{}`. Never fails.
pub fn extract(raw_text: &str) -> Value {
    match try_extract(raw_text) {
        Ok(value) => value,
        Err(failure) => {
            warn!(
                error = %failure,
                response_preview = %truncate_chars(raw_text, 80),
                "Could not recover structured output, using empty value"
            );
            empty_value()
        }
    }
}

/// Recover the object in `raw_text` and deserialize it into `T`.
///
/// Returns `None` for the empty sentinel and for objects that do not fit
/// `T`; both cases are logged.
pub fn extract_as<T: DeserializeOwned>(raw_text: &str) -> Option<T> {
    let value = extract(raw_text);
    if is_empty_value(&value) {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(
                error = %ExtractionFailure::Shape(e.to_string()),
                target_type = std::any::type_name::<T>(),
                "Recovered object does not match the expected record"
            );
            None
        }
    }
}

fn try_extract(raw_text: &str) -> Result<Value, ExtractionFailure> {
    let quoted = braces::outermost_braces_quoted(raw_text);
    let plain = braces::outermost_braces(raw_text);

    let mut candidates = Vec::with_capacity(2);
    candidates.extend(quoted);
    if plain != quoted {
        candidates.extend(plain);
    }

    let mut last = ExtractionFailure::NoPayload;
    for payload in candidates {
        match parse_payload(payload) {
            Ok(value) => return Ok(value),
            Err(e) => last = e,
        }
    }
    Err(last)
}

fn parse_payload(payload: &str) -> Result<Value, ExtractionFailure> {
    let first = match literal::parse_literal(payload) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let cleaned = clean::preclean(payload);
    if cleaned == payload {
        return Err(first.into());
    }
    debug!(error = %first, "Retrying payload after pre-clean");
    Ok(literal::parse_literal(&cleaned)?)
}

/// Answer shape for the topic prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicAnnotation {
    pub topic: String,
}

/// Answer shape for the persons prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonsAnnotation {
    #[serde(default)]
    pub persons: Vec<String>,
}

/// The full per-article shape; call sites may ask for any subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    #[serde(default)]
    pub newspaper: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub persons: Option<Vec<String>>,
}
