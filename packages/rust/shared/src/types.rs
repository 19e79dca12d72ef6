//! Core domain types for notepin caches and note records.
//!
//! Every persisted type serializes with camelCase fields and epoch-millisecond
//! timestamps so files stay readable by older versions of the widget.

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// Content kind of a captured chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    #[default]
    Text,
    /// Any kind this version does not know about.
    #[serde(other)]
    Other,
}

/// A screenshot attached to a chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    /// File name inside the images directory.
    #[serde(default, deserialize_with = "null_as_default")]
    pub filename: String,
    /// Where the image came from (data URL or original path).
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

impl Screenshot {
    pub fn new(filename: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            url: url.into(),
        }
    }
}

/// One unit of captured input waiting in the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: ChunkKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub screenshots: Vec<Screenshot>,
    /// Set by the cache when the chunk is appended.
    #[serde(
        default,
        serialize_with = "chrono::serde::ts_milliseconds_option::serialize",
        deserialize_with = "lenient_millis_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Chunk {
    /// A text chunk with no screenshots.
    pub fn text(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            kind: ChunkKind::Text,
            content: content.into(),
            source: source.into(),
            screenshots: Vec::new(),
            timestamp: None,
        }
    }

    /// Attach a screenshot, keeping upload order.
    pub fn with_screenshot(mut self, screenshot: Screenshot) -> Self {
        self.screenshots.push(screenshot);
        self
    }
}

// ---------------------------------------------------------------------------
// NoteMetadata / Entry
// ---------------------------------------------------------------------------

/// Frozen summary of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(
        default = "unix_epoch",
        serialize_with = "chrono::serde::ts_milliseconds::serialize",
        deserialize_with = "lenient_millis"
    )]
    pub created_at: DateTime<Utc>,
}

/// Durable per-key record of every submitted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// The Unix epoch when the stored record has no usable value.
    #[serde(
        default = "unix_epoch",
        serialize_with = "chrono::serde::ts_milliseconds::serialize",
        deserialize_with = "lenient_millis"
    )]
    pub created_at: DateTime<Utc>,
    #[serde(
        default = "unix_epoch",
        serialize_with = "chrono::serde::ts_milliseconds::serialize",
        deserialize_with = "lenient_millis"
    )]
    pub updated_at: DateTime<Utc>,
    /// Append-only; one element per submission.
    #[serde(default, deserialize_with = "entries_or_empty")]
    pub entries: Vec<Entry>,
}

// ---------------------------------------------------------------------------
// Lenient decoding of hand-edited or older files
// ---------------------------------------------------------------------------

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A non-list `entries` becomes empty; an entry that is not an object is dropped.
fn entries_or_empty<'de, D>(deserializer: D) -> Result<Vec<Entry>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Epoch milliseconds as a number, a numeric string, or an RFC 3339 string.
fn millis_from_value(value: &Value) -> Option<DateTime<Utc>> {
    let millis = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(millis) => millis,
            Err(_) => return DateTime::parse_from_rfc3339(s.trim()).ok().map(|d| d.to_utc()),
        },
        _ => return None,
    };
    Utc.timestamp_millis_opt(millis).single()
}

fn lenient_millis_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(millis_from_value))
}

fn lenient_millis<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_millis_option(deserializer)?.unwrap_or_else(unix_epoch))
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

// ---------------------------------------------------------------------------
// Boundary results
// ---------------------------------------------------------------------------

/// Structured result of an append, as handed back to the UI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Structured result of a submission. Failures never escape as errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docx_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmitOutcome {
    pub fn ok(docx_path: PathBuf) -> Self {
        Self {
            success: true,
            docx_path: Some(docx_path),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            docx_path: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn chunk_uses_wire_field_names() {
        let mut chunk = Chunk::text("hello", "siteA")
            .with_screenshot(Screenshot::new("image_1.png", "data:image/png;base64,AA=="));
        chunk.timestamp = Some(Utc.timestamp_millis_opt(1_700_000_000_123).unwrap());

        let value = serde_json::to_value(&chunk).expect("serialize");
        assert_eq!(value["type"], "text");
        assert_eq!(value["timestamp"], 1_700_000_000_123_i64);
        assert_eq!(value["screenshots"][0]["filename"], "image_1.png");
    }

    #[test]
    fn chunk_tolerates_missing_fields() {
        let chunk: Chunk = serde_json::from_str(r#"{"content":"only text"}"#).expect("parse");
        assert_eq!(chunk.kind, ChunkKind::Text);
        assert_eq!(chunk.content, "only text");
        assert!(chunk.source.is_empty());
        assert!(chunk.screenshots.is_empty());
        assert!(chunk.timestamp.is_none());
    }

    #[test]
    fn chunk_tolerates_nulls_and_unknown_values() {
        let chunk: Chunk = serde_json::from_str(
            r#"{"type":"sketch","content":null,"source":null,"screenshots":[{"filename":null,"url":"x"}],"timestamp":"later"}"#,
        )
        .expect("parse");
        assert_eq!(chunk.kind, ChunkKind::Other);
        assert!(chunk.content.is_empty() && chunk.source.is_empty());
        assert!(chunk.screenshots[0].filename.is_empty());
        assert!(chunk.timestamp.is_none());

        let stringly: Chunk = serde_json::from_str(r#"{"timestamp":"1700000000123"}"#).unwrap();
        assert_eq!(stringly.timestamp.unwrap().timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn metadata_tolerates_missing_dates_and_bad_entries() {
        let meta: NoteMetadata =
            serde_json::from_str(r#"{"tag":"work","title":null,"entries":null}"#).expect("parse");
        assert_eq!(meta.tag, "work");
        assert!(meta.title.is_empty());
        assert!(meta.entries.is_empty());
        assert_eq!(meta.created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(meta.updated_at, DateTime::<Utc>::UNIX_EPOCH);

        let meta: NoteMetadata = serde_json::from_str(
            r#"{"createdAt":1000,"updatedAt":2000,"entries":[{"text":"kept","createdAt":1500},"junk"]}"#,
        )
        .expect("parse");
        assert_eq!(meta.entries.len(), 1);
        assert_eq!(meta.entries[0].text, "kept");

        let meta: NoteMetadata = serde_json::from_str(r#"{"entries":{"not":"a list"}}"#).unwrap();
        assert!(meta.entries.is_empty());
    }

    #[test]
    fn submit_outcome_shapes() {
        let ok = serde_json::to_value(SubmitOutcome::ok("/tmp/a.docx".into())).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["docxPath"], "/tmp/a.docx");
        assert!(ok.get("error").is_none());

        let failed = serde_json::to_value(SubmitOutcome::failed("cache is empty")).unwrap();
        assert_eq!(failed["success"], false);
        assert_eq!(failed["error"], "cache is empty");
    }

    #[test]
    fn metadata_fixture_validates() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/metadata.fixture.json")
            .expect("read fixture");
        let parsed: NoteMetadata =
            serde_json::from_str(&fixture).expect("deserialize fixture metadata");
        assert_eq!(parsed.tag, "work");
        assert_eq!(parsed.title, "Q1");
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[1].images, vec!["image_1700000100000.png"]);
        assert_eq!(parsed.created_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn cache_fixture_validates() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/cache.fixture.json")
            .expect("read fixture");
        let parsed: Vec<Chunk> = serde_json::from_str(&fixture).expect("deserialize fixture cache");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].source, "siteA");
        assert!(parsed.iter().all(|c| c.timestamp.is_some()));
    }
}
