//! # layout2md
//!
//! Convert PDFs and raster images to Markdown, together with the words and
//! lines found on each page and their bounding boxes in unit-square page
//! coordinates.
//!
//! ## How it works
//!
//! A PDF is first read through its own text layer. When that layer is too
//! sparse (a scanned document usually has none), every page is rasterised and
//! sent through OCR instead. Images go straight to OCR. Either way, positions
//! end up as fractions of the page with a top-left origin, so PDF points and
//! OCR pixels can be compared directly.
//!
//! ```text
//! PDF ──▶ text layer ──▶ enough words? ──yes──▶ group into lines ──┐
//!                             │                                    │
//!                             no ──▶ rasterise ──▶ OCR ────────────┼──▶ Markdown
//! image ──────────────────────────────────────────▶ OCR ───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use layout2md::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let result = convert("document.pdf", "application/pdf", &config).await?;
//!     println!("{}", result.markdown);
//!     for line in &result.lines {
//!         eprintln!("p{} {:?} {}", line.page, line.bbox, line.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature     | Default | Description |
//! |-------------|---------|-------------|
//! | `cli`       | on      | Enables the `layout2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `tesseract` | off     | Tesseract OCR engine via `leptess`; needs libtesseract and libleptonica |
//!
//! Without `tesseract`, PDFs with a usable text layer convert normally; OCR
//! requests fail with an extraction error unless a custom
//! [`pipeline::ocr::OcrEngine`] is supplied through [`Converter::with_ocr_engine`].
//!
//! ## Runtime requirements
//!
//! pdfium is loaded at runtime: set `PDFIUM_LIB_PATH`, place the library in
//! the working directory, or install it system-wide.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cancel;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cancel::CancellationToken;
pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{
    convert, convert_from_bytes, convert_sync, convert_to_file, write_markdown, Converter,
};
pub use error::{ErrorKind, Layout2MdError};
pub use output::{BoundingBox, ConversionPath, ConversionResult, Line, Page, Word};
pub use pipeline::input::detect_mime;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
