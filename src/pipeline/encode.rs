//! Image encoding: `DynamicImage` → in-memory PNG for the OCR engine.
//!
//! Tesseract (through leptonica) reads encoded images, not raw pixel
//! buffers. PNG is lossless, so rendered glyph edges reach the recogniser
//! exactly as pdfium drew them; JPEG ringing around small text measurably
//! hurts recognition.

use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a page bitmap as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} page → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}
