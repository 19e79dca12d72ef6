//! Document rendering for exported notes.
//!
//! Callers describe a document as an ordered list of [`DocumentBlock`]s and
//! hand it to a [`DocumentRenderer`], which produces the serialized file.
//! [`DocxRenderer`] is the `docx-rs` backed implementation.

mod docx;

use notepin_shared::Result;

pub use docx::DocxRenderer;

/// One block of document content, in output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentBlock {
    /// A heading line. Level 1 is the document title.
    Heading { text: String, level: u8 },
    /// A single-line paragraph.
    Paragraph(String),
    /// One paragraph whose lines are separated by explicit line breaks.
    Lines(Vec<String>),
    /// An empty paragraph.
    Blank,
    /// An inlined image scaled to `width_px`, height following aspect ratio.
    Image {
        name: String,
        bytes: Vec<u8>,
        width_px: u32,
    },
}

impl DocumentBlock {
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self::Heading {
            text: text.into(),
            level,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph(text.into())
    }
}

/// Turns ordered blocks into a serialized document buffer.
pub trait DocumentRenderer: Send + Sync {
    /// Serialize `blocks`. Images that cannot be decoded are skipped.
    fn render(&self, blocks: &[DocumentBlock]) -> Result<Vec<u8>>;
}
