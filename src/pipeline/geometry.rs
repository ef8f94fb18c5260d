//! Coordinate normalisation into unit-square page space.
//!
//! Two source conventions reach the pipeline:
//!
//! * **PDF content space**: points, origin at the *bottom*-left, y grows
//!   upward. Produced by the native text layer.
//! * **Pixel space**: origin at the *top*-left, y grows downward. Produced by
//!   the OCR engine on rasterised pages and on image inputs.
//!
//! Both are mapped to fractions of the page size with a top-left origin, so
//! only the PDF case needs a vertical flip.

use crate::output::BoundingBox;

/// Rectangle in PDF content space (bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfBounds {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl PdfBounds {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Smallest rectangle containing both.
    pub fn merge(&self, other: &PdfBounds) -> PdfBounds {
        PdfBounds {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }
}

/// Rectangle in pixel space (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A rectangle tagged with the coordinate space it was measured in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceRect {
    Pdf(PdfBounds),
    Pixel(PixelRect),
}

impl From<PdfBounds> for SourceRect {
    fn from(b: PdfBounds) -> Self {
        SourceRect::Pdf(b)
    }
}

impl From<PixelRect> for SourceRect {
    fn from(r: PixelRect) -> Self {
        SourceRect::Pixel(r)
    }
}

/// Map `rect` into unit-square coordinates of a page measuring
/// `page_width × page_height` in the rectangle's own unit.
///
/// # Panics
/// If either page dimension is not a positive finite number. Callers are
/// expected to reject such pages before normalising (see
/// [`crate::pipeline::geometry::valid_page_size`]).
pub fn normalize(rect: impl Into<SourceRect>, page_width: f64, page_height: f64) -> BoundingBox {
    assert!(
        valid_page_size(page_width, page_height),
        "page dimensions must be positive, got {page_width}x{page_height}"
    );

    match rect.into() {
        SourceRect::Pdf(b) => BoundingBox::new(
            b.left / page_width,
            (page_height - b.top) / page_height,
            b.width() / page_width,
            b.height() / page_height,
        ),
        SourceRect::Pixel(r) => BoundingBox::new(
            f64::from(r.x) / page_width,
            f64::from(r.y) / page_height,
            f64::from(r.width) / page_width,
            f64::from(r.height) / page_height,
        ),
    }
}

/// `true` when both dimensions can be divided by.
pub fn valid_page_size(width: f64, height: f64) -> bool {
    width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0
}
