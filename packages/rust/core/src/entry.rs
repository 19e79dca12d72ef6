//! Folding a batch of cached chunks into one [`Entry`].

use chrono::{DateTime, Utc};

use notepin_shared::{Chunk, DefaultsConfig, Entry};

/// Build the entry recorded for one submission of `chunks`.
pub fn build_entry(
    source: &str,
    chunks: &[Chunk],
    defaults: &DefaultsConfig,
    now: DateTime<Utc>,
) -> Entry {
    Entry {
        source: resolve_source(source, chunks, &defaults.no_source_marker),
        text: build_note_text(chunks, &defaults.empty_text_marker),
        images: collect_images(chunks),
        created_at: now,
    }
}

/// Caller source, else the first chunk with a source, else `none_marker`.
pub fn resolve_source(source: &str, chunks: &[Chunk], none_marker: &str) -> String {
    let explicit = source.trim();
    if !explicit.is_empty() {
        return explicit.to_string();
    }

    chunks
        .iter()
        .map(|c| c.source.trim())
        .find(|s| !s.is_empty())
        .unwrap_or(none_marker)
        .to_string()
}

/// Trimmed non-empty contents joined by newlines, or `empty_marker`.
pub fn build_note_text(chunks: &[Chunk], empty_marker: &str) -> String {
    let parts: Vec<&str> = chunks
        .iter()
        .map(|c| c.content.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        empty_marker.to_string()
    } else {
        parts.join("\n")
    }
}

/// Screenshot file names in chunk order, then upload order.
pub fn collect_images(chunks: &[Chunk]) -> Vec<String> {
    chunks
        .iter()
        .flat_map(|c| &c.screenshots)
        .filter(|s| !s.filename.is_empty())
        .map(|s| s.filename.clone())
        .collect()
}
