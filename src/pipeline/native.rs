//! Native PDF text layer: words with their positions in PDF content space.
//!
//! pdfium reports individual characters with loose bounding boxes. They are
//! grouped into words here: a word ends at whitespace or a control character,
//! when the baseline jumps by more than half a glyph height, or when the
//! horizontal gap to the previous glyph exceeds half a glyph height (text
//! positioned with explicit offsets instead of space characters).

use crate::error::Layout2MdError;
use crate::pipeline::geometry::PdfBounds;
use crate::pipeline::pdfium::{bind_pdfium, load_document};
use std::path::Path;
use tracing::{debug, info};

/// One word of the native text layer, in PDF points.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeWord {
    pub text: String,
    pub bounds: PdfBounds,
}

/// One page of the native text layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NativePage {
    /// 1-based page number.
    pub number: usize,
    /// Width in points.
    pub width: f64,
    /// Height in points.
    pub height: f64,
    pub words: Vec<NativeWord>,
}

/// Reads the native text layer of a PDF page by page.
///
/// Pages are handed to `visit` in order as they are read, so the document
/// handle never outlives the call. An error from `visit` stops the walk and
/// is returned unchanged.
pub trait NativeTextSource: Send + Sync {
    fn extract_pages(
        &self,
        path: &Path,
        password: Option<&str>,
        visit: &mut dyn FnMut(NativePage) -> Result<(), Layout2MdError>,
    ) -> Result<(), Layout2MdError>;
}

/// [`NativeTextSource`] backed by pdfium.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumTextSource;

impl NativeTextSource for PdfiumTextSource {
    fn extract_pages(
        &self,
        path: &Path,
        password: Option<&str>,
        visit: &mut dyn FnMut(NativePage) -> Result<(), Layout2MdError>,
    ) -> Result<(), Layout2MdError> {
        let pdfium = bind_pdfium()?;
        let document = load_document(&pdfium, path, password)?;
        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        for (idx, page) in pages.iter().enumerate() {
            let number = idx + 1;
            let text = page
                .text()
                .map_err(|e| Layout2MdError::TextExtractionFailed {
                    page: number,
                    detail: format!("{:?}", e),
                })?;

            let mut glyphs = Vec::new();
            for ch in text.chars().iter() {
                let Some(c) = ch.unicode_char() else {
                    continue;
                };
                let rect = ch
                    .loose_bounds()
                    .map_err(|e| Layout2MdError::TextExtractionFailed {
                        page: number,
                        detail: format!("{:?}", e),
                    })?;
                glyphs.push((
                    c,
                    PdfBounds::new(
                        f64::from(rect.left().value),
                        f64::from(rect.bottom().value),
                        f64::from(rect.right().value),
                        f64::from(rect.top().value),
                    ),
                ));
            }

            let words = split_words(glyphs);
            debug!("Page {}: {} native words", number, words.len());

            visit(NativePage {
                number,
                width: f64::from(page.width().value),
                height: f64::from(page.height().value),
                words,
            })?;
        }

        Ok(())
    }
}

/// Group positioned characters into words.
pub fn split_words<I>(glyphs: I) -> Vec<NativeWord>
where
    I: IntoIterator<Item = (char, PdfBounds)>,
{
    let mut words = Vec::new();
    let mut current: Option<NativeWord> = None;
    let mut last: Option<PdfBounds> = None;

    for (c, bounds) in glyphs {
        if c.is_whitespace() || c.is_control() {
            words.extend(current.take());
            last = None;
            continue;
        }

        if let Some(prev) = last {
            if starts_new_word(&prev, &bounds) {
                words.extend(current.take());
            }
        }

        match current.as_mut() {
            Some(word) => {
                word.text.push(c);
                word.bounds = word.bounds.merge(&bounds);
            }
            None => {
                current = Some(NativeWord {
                    text: c.to_string(),
                    bounds,
                });
            }
        }
        last = Some(bounds);
    }

    words.extend(current);
    words
}

fn starts_new_word(prev: &PdfBounds, next: &PdfBounds) -> bool {
    let glyph_height = prev.height().max(next.height());
    if glyph_height <= 0.0 {
        return false;
    }
    let limit = glyph_height / 2.0;
    (next.bottom - prev.bottom).abs() > limit || next.left - prev.right > limit
}
