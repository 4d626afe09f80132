use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DefaultOnError};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::{StorageError, StorageResult};
use crate::notes::Note;

/// A note as read back from storage, before it is given a session id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNote {
    pub content: String,
    pub timestamp: OffsetDateTime,
    pub pinned: bool,
}

#[derive(Debug, Serialize)]
struct PersistedNote<'a> {
    content: &'a str,
    timestamp: String,
    pinned: bool,
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct RawNote {
    content: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    timestamp: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pinned: bool,
}

pub fn encode(notes: &[&Note]) -> StorageResult<String> {
    let mut records = Vec::with_capacity(notes.len());
    for note in notes.iter().filter(|note| !note.is_blank()) {
        records.push(PersistedNote {
            content: note.content(),
            timestamp: note.timestamp().format(&Rfc3339)?,
            pinned: note.pinned(),
        });
    }
    serde_json::to_string(&records).map_err(StorageError::from)
}

/// Decodes the notes record leniently: anything unreadable at the top level
/// is an empty collection, and bad entries are skipped one by one.
pub fn decode(raw: &str, now: OffsetDateTime) -> Vec<StoredNote> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "notes record is not valid JSON; starting empty");
            return Vec::new();
        }
    };
    let Value::Array(entries) = value else {
        tracing::warn!("notes record is not a list; starting empty");
        return Vec::new();
    };

    let total = entries.len();
    let notes: Vec<StoredNote> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| decode_entry(index, entry, now))
        .collect();
    if notes.len() < total {
        tracing::debug!(skipped = total - notes.len(), total, "skipped stored entries");
    }
    notes
}

fn decode_entry(index: usize, entry: Value, now: OffsetDateTime) -> Option<StoredNote> {
    let note = match entry {
        // legacy shape: bare content strings
        Value::String(content) => StoredNote {
            content,
            timestamp: now,
            pinned: false,
        },
        Value::Object(_) => {
            let raw: RawNote = match serde_json::from_value(entry) {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::debug!(index, error = %err, "skipping malformed note entry");
                    return None;
                }
            };
            StoredNote {
                timestamp: parse_timestamp(index, raw.timestamp.as_deref()).unwrap_or(now),
                content: raw.content,
                pinned: raw.pinned,
            }
        }
        other => {
            tracing::debug!(index, kind = value_kind(&other), "skipping non-note entry");
            return None;
        }
    };
    if note.content.trim().is_empty() {
        tracing::debug!(index, "skipping blank note entry");
        return None;
    }
    Some(note)
}

fn parse_timestamp(index: usize, raw: Option<&str>) -> Option<OffsetDateTime> {
    let raw = raw?;
    match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(timestamp) => Some(timestamp),
        Err(err) => {
            tracing::debug!(index, raw, error = %err, "unreadable timestamp; using now");
            None
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
