//! Result types: pages, words, lines and their unit-square bounding boxes.
//!
//! All geometry in the output is expressed in *unit-square coordinates*:
//! fractions of the page width/height with the origin at the top-left
//! corner. A consumer re-projects a box onto a rendered page image of
//! `W × H` pixels by multiplying `x`/`width` by `W` and `y`/`height` by `H`.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in unit-square page coordinates.
///
/// Constructed values are always clamped into `[0, 1]`: `x + width` and
/// `y + height` never exceed `1`, and neither extent is negative. Source
/// rectangles that spill off the page (common with italic glyph bounds or
/// OCR boxes touching the border) are cropped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Build a box, clipping it to the unit square.
    ///
    /// Clipping works on the edges: the part of the box that lies on the
    /// page keeps its true right and bottom edges.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_edges(x, y, x + width, y + height)
    }

    /// Build a box from its four edges, each clamped into `[0, 1]`.
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        let (left, top) = (clamp_unit(left), clamp_unit(top));
        let (right, bottom) = (clamp_unit(right), clamp_unit(bottom));
        Self {
            x: left,
            y: top,
            width: (right - left).max(0.0),
            height: (bottom - top).max(0.0),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Smallest box containing every box in `boxes`, or `None` when empty.
    pub fn union<'a, I>(boxes: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        let mut iter = boxes.into_iter();
        let first = iter.next()?;
        let (mut left, mut top, mut right, mut bottom) =
            (first.x, first.y, first.right(), first.bottom());
        for b in iter {
            left = left.min(b.x);
            top = top.min(b.y);
            right = right.max(b.right());
            bottom = bottom.max(b.bottom());
        }
        Some(Self::from_edges(left, top, right, bottom))
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// One physical page, in the unit its source reported (PDF points or pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-indexed page number.
    pub number: usize,
    pub width: f64,
    pub height: f64,
}

/// A single recognised word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub page: usize,
    pub text: String,
    pub bbox: BoundingBox,
}

/// A line of text: grouped from words (native PDF) or reported by OCR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub page: usize,
    pub text: String,
    pub bbox: BoundingBox,
}

/// Which conversion path produced a [`ConversionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionPath {
    /// The PDF's own text layer was used.
    NativePdf,
    /// The PDF's text layer was too sparse; pages were rasterised and OCR'd.
    OcrFallback,
    /// The input was a raster image.
    ImageOcr,
}

impl std::fmt::Display for ConversionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConversionPath::NativePdf => "native PDF text",
            ConversionPath::OcrFallback => "OCR fallback",
            ConversionPath::ImageOcr => "image OCR",
        };
        f.write_str(s)
    }
}

/// The complete output of one conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Line texts joined by `\n`, optionally normalised.
    pub markdown: String,
    /// Pages in traversal order.
    pub pages: Vec<Page>,
    /// Lines in traversal order, top-to-bottom within each page.
    pub lines: Vec<Line>,
    /// Words in traversal order.
    pub words: Vec<Word>,
    /// Path taken to produce this result.
    pub source: ConversionPath,
}

impl ConversionResult {
    /// Lines belonging to the given 1-indexed page.
    pub fn lines_on_page(&self, page: usize) -> impl Iterator<Item = &Line> {
        self.lines.iter().filter(move |l| l.page == page)
    }

    /// Words belonging to the given 1-indexed page.
    pub fn words_on_page(&self, page: usize) -> impl Iterator<Item = &Word> {
        self.words.iter().filter(move |w| w.page == page)
    }
}
