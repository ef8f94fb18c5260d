//! Error types for the layout2md library.
//!
//! Every failure is fatal for the conversion that raised it: no partial
//! [`crate::output::ConversionResult`] is ever returned. Variants carry the
//! path or page they concern, and [`Layout2MdError::kind`] folds them into the
//! small set of [`ErrorKind`]s callers usually branch on.
//!
//! A sparse native text layer is *not* an error. It triggers the OCR fallback
//! and is only logged.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`Layout2MdError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The caller passed a blank path or an invalid configuration.
    InvalidArgument,
    /// The MIME type is neither `application/pdf` nor `image/*`.
    UnsupportedFormat,
    /// Cooperative cancellation was observed.
    Cancelled,
    /// The source file could not be opened or parsed.
    SourceRead,
    /// The parser, rasterizer or OCR engine failed.
    Extraction,
    /// Writing a result file failed.
    Output,
    /// A blocking task panicked or the runtime could not be built.
    Internal,
}

/// All errors returned by the layout2md library.
#[derive(Debug, Error)]
pub enum Layout2MdError {
    // ── Argument errors ───────────────────────────────────────────────────
    /// Missing or blank input path.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// MIME type is not handled by any conversion path.
    #[error("Unsupported MIME type '{mime}'\nSupported: application/pdf, image/*")]
    UnsupportedFormat { mime: String },

    /// The caller cancelled the conversion.
    #[error("Conversion cancelled")]
    Cancelled,

    // ── Source errors ─────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was declared as a PDF but does not start with `%PDF`.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Reading the file failed after it was opened.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image could not be opened or decoded.
    #[error("Cannot read image '{path}': {detail}")]
    UnreadableImage { path: PathBuf, detail: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The native text layer of a page could not be read.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// pdfium returned an error while rendering a page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The OCR engine failed on a page.
    #[error("OCR failed for page {page}: {detail}")]
    OcrFailed { page: usize, detail: String },

    /// No OCR engine could be started (backend missing or not initialisable).
    #[error("OCR engine unavailable: {0}")]
    OcrUnavailable(String),

    /// A page reported a zero or non-finite width/height.
    #[error("Page {page} has invalid dimensions {width}x{height}")]
    InvalidPageSize { page: usize, width: f64, height: f64 },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the working\n\
directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Layout2MdError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        use Layout2MdError::*;
        match self {
            InvalidArgument { .. } | InvalidConfig(_) => ErrorKind::InvalidArgument,
            UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Cancelled => ErrorKind::Cancelled,
            FileNotFound { .. }
            | PermissionDenied { .. }
            | NotAPdf { .. }
            | CorruptPdf { .. }
            | PasswordRequired { .. }
            | WrongPassword { .. }
            | ReadFailed { .. }
            | UnreadableImage { .. } => ErrorKind::SourceRead,
            TextExtractionFailed { .. }
            | RasterisationFailed { .. }
            | OcrFailed { .. }
            | OcrUnavailable(_)
            | InvalidPageSize { .. }
            | PdfiumBindingFailed(_) => ErrorKind::Extraction,
            OutputWriteFailed { .. } => ErrorKind::Output,
            Internal(_) => ErrorKind::Internal,
        }
    }

    /// `true` when the conversion stopped because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Layout2MdError::Cancelled)
    }
}
