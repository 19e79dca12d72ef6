//! `.docx` output via `docx-rs`.

use std::io::Cursor;

use docx_rs::{BreakType, Docx, Paragraph, Pic, Run};
use image::ImageFormat;
use tracing::{debug, instrument, warn};

use notepin_shared::{NotepinError, Result};

use crate::{DocumentBlock, DocumentRenderer};

/// English Metric Units per pixel at 96 DPI.
const EMU_PER_PX: u32 = 9525;

/// Run sizes are in half-points.
const BODY_SIZE: usize = 22;

#[derive(Debug, Clone, Copy, Default)]
pub struct DocxRenderer;

impl DocxRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for DocxRenderer {
    #[instrument(skip_all, fields(blocks = blocks.len()))]
    fn render(&self, blocks: &[DocumentBlock]) -> Result<Vec<u8>> {
        let mut docx = Docx::new();

        for block in blocks {
            let paragraph = match block {
                DocumentBlock::Heading { text, level } => Paragraph::new().add_run(
                    Run::new()
                        .add_text(text.as_str())
                        .bold()
                        .size(heading_size(*level)),
                ),
                DocumentBlock::Paragraph(text) => Paragraph::new()
                    .add_run(Run::new().add_text(text.as_str()).size(BODY_SIZE)),
                DocumentBlock::Lines(lines) => {
                    let mut run = Run::new().size(BODY_SIZE);
                    for (i, line) in lines.iter().enumerate() {
                        if i > 0 {
                            run = run.add_break(BreakType::TextWrapping);
                        }
                        run = run.add_text(line.as_str());
                    }
                    Paragraph::new().add_run(run)
                }
                DocumentBlock::Blank => Paragraph::new(),
                DocumentBlock::Image {
                    name,
                    bytes,
                    width_px,
                } => match scaled_picture(bytes, *width_px) {
                    Ok(pic) => Paragraph::new().add_run(Run::new().add_image(pic)),
                    Err(e) => {
                        warn!(image = %name, error = %e, "skipping undecodable image");
                        continue;
                    }
                },
            };
            docx = docx.add_paragraph(paragraph);
        }

        let mut buf = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buf)
            .map_err(|e| NotepinError::Render(e.to_string()))?;

        let bytes = buf.into_inner();
        debug!(size = bytes.len(), "packed docx");
        Ok(bytes)
    }
}

fn heading_size(level: u8) -> usize {
    match level {
        0 | 1 => 36,
        2 => 28,
        _ => 24,
    }
}

/// Decode, normalize to PNG and size the picture to `width_px` wide.
fn scaled_picture(bytes: &[u8], width_px: u32) -> Result<Pic> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| NotepinError::Render(format!("cannot decode image: {e}")))?;

    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 || width_px == 0 {
        return Err(NotepinError::Render("image has zero size".into()));
    }
    let height_px = scaled_height(w, h, width_px);

    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, ImageFormat::Png)
        .map_err(|e| NotepinError::Render(format!("cannot encode image: {e}")))?;

    Ok(Pic::new(png.get_ref()).size(
        width_px.saturating_mul(EMU_PER_PX),
        height_px.saturating_mul(EMU_PER_PX),
    ))
}

fn scaled_height(w: u32, h: u32, width_px: u32) -> u32 {
    let scaled = (u64::from(h) * u64::from(width_px) + u64::from(w) / 2) / u64::from(w);
    u32::try_from(scaled.max(1)).unwrap_or(u32::MAX)
}
