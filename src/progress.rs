//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline processes each page. Callbacks run on the blocking
//! thread that drives the conversion, so they should return quickly.
//!
//! # Example
//!
//! ```rust
//! use layout2md::{ConversionConfig, ConversionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, lines: usize, words: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}: {lines} lines, {words} words");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { pages: AtomicUsize::new(0) });
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ConversionPath;
use std::sync::Arc;

/// Called by the conversion pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called when a conversion path is entered. A PDF whose text layer is
    /// too sparse reports `NativePdf` first and `OcrFallback` afterwards.
    fn on_conversion_start(&self, path: ConversionPath) {
        let _ = path;
    }

    /// Called after a page has been fully processed.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `lines`: lines produced for the page
    /// * `words`: words produced for the page
    fn on_page_complete(&self, page_num: usize, lines: usize, words: usize) {
        let _ = (page_num, lines, words);
    }

    /// Called when the native text layer is discarded in favour of OCR.
    fn on_ocr_fallback(&self, native_words: usize, threshold: usize) {
        let _ = (native_words, threshold);
    }

    /// Called once after the result has been assembled.
    fn on_conversion_complete(&self, path: ConversionPath, pages: usize) {
        let _ = (path, pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
