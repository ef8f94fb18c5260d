//! PDF rasterisation: render every page to a `DynamicImage` via pdfium.
//!
//! Used only by the OCR fallback. Pages are rendered at a fixed DPI so the
//! recogniser sees glyphs at a predictable size; the target width is derived
//! from the page's width in points.
//!
//! Like the text source, this is blocking code. The converter calls it from
//! inside `tokio::task::spawn_blocking`.

use crate::error::Layout2MdError;
use crate::pipeline::pdfium::{bind_pdfium, load_document, POINTS_PER_INCH};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// One rendered page.
#[derive(Debug, Clone)]
pub struct RasterPage {
    /// 1-based page number.
    pub number: usize,
    pub image: DynamicImage,
}

/// Renders PDF pages to bitmaps.
///
/// Pages are handed to `visit` in order so that at most one bitmap is held
/// at a time. An error from `visit` stops rendering and is returned
/// unchanged.
pub trait Rasterizer: Send + Sync {
    fn rasterize(
        &self,
        path: &Path,
        dpi: u32,
        password: Option<&str>,
        visit: &mut dyn FnMut(RasterPage) -> Result<(), Layout2MdError>,
    ) -> Result<(), Layout2MdError>;
}

/// [`Rasterizer`] backed by pdfium.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumRasterizer;

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        path: &Path,
        dpi: u32,
        password: Option<&str>,
        visit: &mut dyn FnMut(RasterPage) -> Result<(), Layout2MdError>,
    ) -> Result<(), Layout2MdError> {
        let pdfium = bind_pdfium()?;
        let document = load_document(&pdfium, path, password)?;
        let pages = document.pages();
        info!("Rasterising {} pages at {} DPI", pages.len(), dpi);

        for (idx, page) in pages.iter().enumerate() {
            let number = idx + 1;
            let target_width = target_pixels(page.width().value, dpi);
            let render_config = PdfRenderConfig::new().set_target_width(target_width);

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                Layout2MdError::RasterisationFailed {
                    page: number,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                number,
                image.width(),
                image.height()
            );

            visit(RasterPage { number, image })?;
        }

        Ok(())
    }
}

/// Pixel count for `points` at `dpi`, never less than one.
fn target_pixels(points: f32, dpi: u32) -> i32 {
    ((points * dpi as f32 / POINTS_PER_INCH).round() as i32).max(1)
}
