//! Note metadata → ordered document blocks.
//!
//! Layout is pure: the same metadata and image bytes always give the same
//! blocks. Image bytes are loaded beforehand by [`load_images`] so that
//! missing files are decided in one place.

use std::collections::HashMap;

use chrono::{DateTime, Local, Utc};
use tracing::{debug, warn};

use notepin_document::DocumentBlock;
use notepin_shared::{DefaultsConfig, DocumentConfig, NoteMetadata, NotepinError, Result};
use notepin_storage::ImageStore;

/// Image bytes keyed by stored file name.
pub type LoadedImages = HashMap<String, Vec<u8>>;

/// `YYYY-MM-DD HH:MM` in local time.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Read every image referenced by `metadata`.
///
/// An image that is missing or cannot be read is logged and left out.
pub async fn load_images(metadata: &NoteMetadata, store: &ImageStore) -> Result<LoadedImages> {
    let mut loaded = LoadedImages::new();

    for filename in metadata.entries.iter().flat_map(|e| &e.images) {
        if loaded.contains_key(filename) {
            continue;
        }
        match store.load(filename).await {
            Ok(Some(bytes)) => {
                loaded.insert(filename.clone(), bytes);
            }
            Ok(None) => {
                let missing = NotepinError::MissingImage {
                    path: store.resolve(filename).unwrap_or_else(|| filename.into()),
                };
                warn!(error = %missing, "skipping image");
            }
            Err(e) => warn!(%filename, error = %e, "skipping unreadable image"),
        }
    }

    debug!(count = loaded.len(), "loaded images");
    Ok(loaded)
}

/// Lay out the whole record: header, then every entry in order.
pub fn document_blocks(
    metadata: &NoteMetadata,
    document: &DocumentConfig,
    defaults: &DefaultsConfig,
    images: &LoadedImages,
) -> Vec<DocumentBlock> {
    let labels = &document.labels;
    let tag = non_empty_or(&metadata.tag, &defaults.tag);
    let title = non_empty_or(&metadata.title, &defaults.title);

    let mut blocks = vec![
        DocumentBlock::heading(format!("{tag} - {title}"), 1),
        DocumentBlock::paragraph(format!(
            "{}: {}",
            labels.created,
            format_timestamp(metadata.created_at)
        )),
        DocumentBlock::paragraph(format!(
            "{}: {}",
            labels.updated,
            format_timestamp(metadata.updated_at)
        )),
        DocumentBlock::paragraph("---"),
        DocumentBlock::heading(labels.entries.as_str(), 2),
        DocumentBlock::Blank,
    ];

    for (index, entry) in metadata.entries.iter().enumerate() {
        if index > 0 {
            blocks.push(DocumentBlock::Blank);
        }

        let source = non_empty_or(&entry.source, &defaults.no_source_marker);
        blocks.push(DocumentBlock::paragraph(format!(
            "- {}: {source}",
            labels.source
        )));

        let text = non_empty_or(&entry.text, &defaults.empty_text_marker);
        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    format!("  {}: {line}", labels.text)
                } else {
                    line.to_string()
                }
            })
            .collect();
        blocks.push(DocumentBlock::Lines(lines));

        for filename in &entry.images {
            if let Some(bytes) = images.get(filename) {
                blocks.push(DocumentBlock::Image {
                    name: filename.clone(),
                    bytes: bytes.clone(),
                    width_px: document.image_width_px,
                });
            }
        }
    }

    blocks
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}
