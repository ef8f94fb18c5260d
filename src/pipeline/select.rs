//! Native-text vs. OCR decision.

/// Outcome of [`select_source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceDecision {
    /// Keep the words read from the PDF text layer.
    NativeAccepted,
    /// Discard the text layer and OCR every page.
    OcrRequired,
}

/// Decide whether a document's text layer is worth keeping.
///
/// `native_word_count` is the total over *all* pages: a PDF with one scanned
/// page among digital ones keeps its native text, and a PDF below the
/// threshold is OCR'd in full, not page by page.
pub fn select_source(native_word_count: usize, threshold: usize) -> SourceDecision {
    if native_word_count < threshold {
        SourceDecision::OcrRequired
    } else {
        SourceDecision::NativeAccepted
    }
}
