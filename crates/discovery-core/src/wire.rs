//! JSON layout of persisted answers.
//!
//! Answers are a flat object: `q<id>` maps to the array of checked option
//! values, `q<id>_text` to the trimmed free text. Empty values are never
//! written and are dropped on read.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::answer::{AnswerValue, Snapshot};
use crate::catalog::QuestionId;
use crate::time::Timestamp;

pub const CURRENT_VERSION: &str = "1";

const TEXT_SUFFIX: &str = "_text";

#[derive(Debug)]
pub enum WireError {
    Json(serde_json::Error),
    NotAnObject,
    UnsupportedVersion(String),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Json(e) => write!(f, "malformed JSON: {e}"),
            WireError::NotAnObject => f.write_str("answers must be a JSON object"),
            WireError::UnsupportedVersion(v) => write!(f, "unsupported export version '{v}'"),
        }
    }
}

impl std::error::Error for WireError {}

impl From<serde_json::Error> for WireError {
    fn from(e: serde_json::Error) -> Self {
        WireError::Json(e)
    }
}

pub fn choice_key(id: QuestionId) -> String {
    format!("q{id}")
}

pub fn text_key(id: QuestionId) -> String {
    format!("q{id}{TEXT_SUFFIX}")
}

enum Key {
    Choice(QuestionId),
    Text(QuestionId),
}

fn parse_key(key: &str) -> Option<Key> {
    let rest = key.strip_prefix('q')?;
    match rest.strip_suffix(TEXT_SUFFIX) {
        Some(id) => id.parse().ok().map(Key::Text),
        None => rest.parse().ok().map(Key::Choice),
    }
}

pub fn answers_to_value(snapshot: &Snapshot) -> Value {
    let mut map = Map::new();
    for (id, value) in snapshot.iter() {
        match value {
            AnswerValue::Choices(set) => {
                let values = set.iter().cloned().map(Value::String).collect();
                map.insert(choice_key(id), Value::Array(values));
            }
            AnswerValue::Text(text) => {
                map.insert(text_key(id), Value::String(text.clone()));
            }
        }
    }
    Value::Object(map)
}

/// Read answers from a parsed JSON value.
///
/// Entries with unrecognised keys or value shapes are skipped. When a
/// question has both a choice and a text entry, the choice wins.
pub fn answers_from_value(value: &Value) -> Result<Snapshot, WireError> {
    let map = value.as_object().ok_or(WireError::NotAnObject)?;
    let mut snapshot = Snapshot::new();
    let mut texts = Vec::new();

    for (key, entry) in map {
        match parse_key(key) {
            Some(Key::Choice(id)) => {
                let Some(items) = entry.as_array() else {
                    tracing::debug!("skipping '{key}': expected an array");
                    continue;
                };
                let values = items.iter().filter_map(Value::as_str);
                snapshot.set(id, AnswerValue::choices(values));
            }
            Some(Key::Text(id)) => match entry.as_str() {
                Some(text) => texts.push((id, text)),
                None => tracing::debug!("skipping '{key}': expected a string"),
            },
            None => tracing::debug!("skipping unrecognised answer key '{key}'"),
        }
    }

    for (id, text) in texts {
        if !snapshot.contains(id) {
            snapshot.set(id, AnswerValue::text(text));
        }
    }

    Ok(snapshot)
}

pub fn encode_answers(snapshot: &Snapshot) -> serde_json::Result<String> {
    serde_json::to_string(&answers_to_value(snapshot))
}

pub fn decode_answers(json: &str) -> Result<Snapshot, WireError> {
    let value: Value = serde_json::from_str(json)?;
    answers_from_value(&value)
}

// --- Portable export document ---

#[derive(Serialize, Deserialize, Debug)]
pub struct WireExport {
    pub version: String,
    #[serde(rename = "savedAt", default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    pub answers: Value,
}

pub fn export_json(snapshot: &Snapshot, saved_at: Option<Timestamp>) -> serde_json::Result<String> {
    let export = WireExport {
        version: CURRENT_VERSION.to_string(),
        saved_at: saved_at.map(|t| t.to_iso8601()),
        answers: answers_to_value(snapshot),
    };
    serde_json::to_string_pretty(&export)
}

/// Parse an export document. A `savedAt` that does not parse is dropped.
pub fn import_json(json: &str) -> Result<(Snapshot, Option<Timestamp>), WireError> {
    let export: WireExport = serde_json::from_str(json)?;
    if export.version != CURRENT_VERSION {
        return Err(WireError::UnsupportedVersion(export.version));
    }
    let snapshot = answers_from_value(&export.answers)?;
    let saved_at = export.saved_at.and_then(|s| s.parse().ok());
    Ok((snapshot, saved_at))
}
