//! OCR engine seam and the adapter that turns its output into lines and words.
//!
//! An [`OcrEngine`] opens one [`OcrSession`] per conversion; the session is
//! fed page bitmaps one at a time and answers with an [`OcrPage`]: the
//! recognised text lines and words, each with a pixel rectangle, in the
//! engine's iteration order. [`collect_page`] trims, drops empty entries and
//! normalises the rectangles. OCR lines are kept as the engine reports them;
//! they are never regrouped from the words.
//!
//! The Tesseract engine recognises each page once and reports its layout as
//! TSV, which [`parse_tsv`] turns into an [`OcrPage`].

use crate::error::Layout2MdError;
use crate::output::{Line, Word};
use crate::pipeline::geometry::{normalize, PixelRect};
use image::DynamicImage;
use std::collections::HashMap;
use std::path::PathBuf;

/// TSV `level` column values for a text line and a word.
const TSV_LINE_LEVEL: u32 = 4;
const TSV_WORD_LEVEL: u32 = 5;
/// Columns up to and including `conf`; `text` may be cut off on line rows.
const TSV_MIN_FIELDS: usize = 11;

/// Settings an engine needs to open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrSettings {
    /// Language codes joined by `+`, e.g. `"eng+deu"`.
    pub languages: String,
    /// Directory holding the trained language data; `None` uses the engine default.
    pub data_path: Option<PathBuf>,
}

/// One recognised item in pixel space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrItem {
    pub text: String,
    pub rect: PixelRect,
}

impl OcrItem {
    pub fn new(text: impl Into<String>, rect: PixelRect) -> Self {
        Self {
            text: text.into(),
            rect,
        }
    }
}

/// Recognition result for one page bitmap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcrPage {
    pub lines: Vec<OcrItem>,
    pub words: Vec<OcrItem>,
}

impl OcrPage {
    /// Line-level pass, in iteration order.
    pub fn lines(&self) -> impl Iterator<Item = &OcrItem> {
        self.lines.iter()
    }

    /// Word-level pass, in iteration order.
    pub fn words(&self) -> impl Iterator<Item = &OcrItem> {
        self.words.iter()
    }
}

/// Factory for per-conversion OCR sessions.
pub trait OcrEngine: Send + Sync {
    fn session(&self, settings: &OcrSettings) -> Result<Box<dyn OcrSession>, Layout2MdError>;
}

/// A live recogniser, owned by a single conversion.
pub trait OcrSession {
    fn recognize(&mut self, image: &DynamicImage) -> Result<OcrPage, Layout2MdError>;
}

/// Convert one page of OCR output into normalised lines and words.
///
/// `width` and `height` are the bitmap's pixel dimensions and must be
/// positive.
pub fn collect_page(page: usize, ocr: &OcrPage, width: u32, height: u32) -> (Vec<Line>, Vec<Word>) {
    let (w, h) = (f64::from(width), f64::from(height));

    let lines = ocr
        .lines()
        .filter_map(|item| {
            let text = item.text.trim();
            (!text.is_empty()).then(|| Line {
                page,
                text: text.to_string(),
                bbox: normalize(item.rect, w, h),
            })
        })
        .collect();

    let words = ocr
        .words()
        .filter_map(|item| {
            let text = item.text.trim();
            (!text.is_empty()).then(|| Word {
                page,
                text: text.to_string(),
                bbox: normalize(item.rect, w, h),
            })
        })
        .collect();

    (lines, words)
}

/// Parse Tesseract TSV output for one page.
///
/// Columns are `level page block par line word left top width height conf
/// text`. Line rows carry no text; a line's text is its words joined by
/// single spaces. Rows of other levels and a header row are skipped. A line
/// or word row with a malformed number fails the page.
pub fn parse_tsv(page: usize, tsv: &str) -> Result<OcrPage, Layout2MdError> {
    let mut out = OcrPage::default();
    let mut line_at: HashMap<[i64; 4], usize> = HashMap::new();
    let mut line_words: Vec<Vec<String>> = Vec::new();

    for (row, raw) in tsv.lines().enumerate() {
        let fields: Vec<&str> = raw.trim_end_matches('\r').split('\t').collect();
        let Ok(level) = fields[0].trim().parse::<u32>() else {
            continue;
        };
        if level != TSV_LINE_LEVEL && level != TSV_WORD_LEVEL {
            continue;
        }

        let malformed = |detail: String| Layout2MdError::OcrFailed {
            page,
            detail: format!("malformed TSV row {}: {}", row + 1, detail),
        };
        if fields.len() < TSV_MIN_FIELDS {
            return Err(malformed(format!("{} columns", fields.len())));
        }
        let num = |i: usize| {
            fields[i]
                .trim()
                .parse::<i64>()
                .map_err(|_| malformed(format!("'{}' in column {}", fields[i], i + 1)))
        };

        let key = [num(1)?, num(2)?, num(3)?, num(4)?];
        let rect = PixelRect::new(
            pixels(num(6)?),
            pixels(num(7)?),
            pixels(num(8)?),
            pixels(num(9)?),
        );

        if level == TSV_LINE_LEVEL {
            line_at.insert(key, out.lines.len());
            out.lines.push(OcrItem::new(String::new(), rect));
            line_words.push(Vec::new());
        } else {
            let text = fields.get(11).copied().unwrap_or_default();
            if let Some(&i) = line_at.get(&key) {
                if !text.trim().is_empty() {
                    line_words[i].push(text.trim().to_string());
                }
            }
            out.words.push(OcrItem::new(text, rect));
        }
    }

    for (line, words) in out.lines.iter_mut().zip(line_words) {
        line.text = words.join(" ");
    }
    Ok(out)
}

fn pixels(v: i64) -> u32 {
    u32::try_from(v.max(0)).unwrap_or(u32::MAX)
}

/// The engine used when none is supplied: Tesseract when compiled in.
pub fn default_ocr_engine() -> std::sync::Arc<dyn OcrEngine> {
    #[cfg(feature = "tesseract")]
    {
        std::sync::Arc::new(tesseract::TesseractEngine)
    }
    #[cfg(not(feature = "tesseract"))]
    {
        std::sync::Arc::new(UnavailableEngine)
    }
}

/// Stand-in that fails every session when no OCR backend was compiled in.
#[cfg(not(feature = "tesseract"))]
#[derive(Debug, Clone, Copy, Default)]
struct UnavailableEngine;

#[cfg(not(feature = "tesseract"))]
impl OcrEngine for UnavailableEngine {
    fn session(&self, _settings: &OcrSettings) -> Result<Box<dyn OcrSession>, Layout2MdError> {
        Err(Layout2MdError::OcrUnavailable(
            "no OCR backend compiled in; rebuild with `--features tesseract`".into(),
        ))
    }
}

#[cfg(feature = "tesseract")]
pub use tesseract::TesseractEngine;

#[cfg(feature = "tesseract")]
mod tesseract {
    use super::{parse_tsv, OcrEngine, OcrPage, OcrSession, OcrSettings};
    use crate::error::Layout2MdError;
    use crate::pipeline::encode::encode_png;
    use image::DynamicImage;
    use leptess::LepTess;
    use tracing::debug;

    /// [`OcrEngine`] backed by Tesseract through `leptess`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct TesseractEngine;

    impl OcrEngine for TesseractEngine {
        fn session(&self, settings: &OcrSettings) -> Result<Box<dyn OcrSession>, Layout2MdError> {
            let data_path = settings
                .data_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned());
            let lt = LepTess::new(data_path.as_deref(), &settings.languages).map_err(|e| {
                Layout2MdError::OcrUnavailable(format!(
                    "failed to initialise Tesseract with language '{}': {}",
                    settings.languages, e
                ))
            })?;
            debug!("Tesseract session opened ({})", settings.languages);
            Ok(Box::new(TesseractSession { lt, page: 0 }))
        }
    }

    struct TesseractSession {
        lt: LepTess,
        page: usize,
    }

    impl TesseractSession {
        fn fail(&self, detail: impl Into<String>) -> Layout2MdError {
            Layout2MdError::OcrFailed {
                page: self.page,
                detail: detail.into(),
            }
        }
    }

    impl OcrSession for TesseractSession {
        fn recognize(&mut self, image: &DynamicImage) -> Result<OcrPage, Layout2MdError> {
            self.page += 1;
            let png = encode_png(image).map_err(|e| self.fail(format!("PNG encoding: {}", e)))?;
            self.lt
                .set_image_from_mem(&png)
                .map_err(|e| self.fail(format!("image load: {}", e)))?;

            // Recognises the whole page once; lines and words come from the
            // same pass.
            let tsv = self
                .lt
                .get_tsv_text(0)
                .map_err(|e| self.fail(format!("text recognition: {}", e)))?;
            let page = parse_tsv(self.page, &tsv)?;

            debug!(
                "OCR page {}: {} lines, {} words",
                self.page,
                page.lines.len(),
                page.words.len()
            );
            Ok(page)
        }
    }
}
