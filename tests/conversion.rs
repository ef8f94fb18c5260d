//! Pipeline tests with in-memory collaborators.
//!
//! The text source, rasteriser and OCR engine are replaced by deterministic
//! fakes, so these run without pdfium or Tesseract installed.

use image::DynamicImage;
use layout2md::pipeline::geometry::{PdfBounds, PixelRect};
use layout2md::pipeline::native::{NativePage, NativeTextSource, NativeWord};
use layout2md::pipeline::ocr::{OcrEngine, OcrItem, OcrPage, OcrSession, OcrSettings};
use layout2md::pipeline::render::{RasterPage, Rasterizer};
use layout2md::{
    convert_from_bytes, CancellationToken, ConversionConfig, ConversionPath,
    ConversionProgressCallback, Converter, ErrorKind, Layout2MdError,
};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

// ── Fakes ────────────────────────────────────────────────────────────────

struct FakeText {
    pages: Vec<NativePage>,
    visited: AtomicUsize,
}

impl FakeText {
    fn new(pages: Vec<NativePage>) -> Arc<Self> {
        Arc::new(Self {
            pages,
            visited: AtomicUsize::new(0),
        })
    }
}

impl NativeTextSource for FakeText {
    fn extract_pages(
        &self,
        _path: &Path,
        _password: Option<&str>,
        visit: &mut dyn FnMut(NativePage) -> Result<(), Layout2MdError>,
    ) -> Result<(), Layout2MdError> {
        for page in &self.pages {
            self.visited.fetch_add(1, Ordering::SeqCst);
            visit(page.clone())?;
        }
        Ok(())
    }
}

struct FakeRaster {
    pages: usize,
    width: u32,
    height: u32,
    fail_on: Option<usize>,
    calls: AtomicUsize,
}

impl FakeRaster {
    fn with_pages(pages: usize) -> Self {
        Self {
            pages,
            width: 1000,
            height: 2000,
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn new(pages: usize) -> Arc<Self> {
        Arc::new(Self::with_pages(pages))
    }

    fn failing_on(page: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_on: Some(page),
            ..Self::with_pages(3)
        })
    }
}

impl Rasterizer for FakeRaster {
    fn rasterize(
        &self,
        _path: &Path,
        _dpi: u32,
        _password: Option<&str>,
        visit: &mut dyn FnMut(RasterPage) -> Result<(), Layout2MdError>,
    ) -> Result<(), Layout2MdError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for number in 1..=self.pages {
            if self.fail_on == Some(number) {
                return Err(Layout2MdError::RasterisationFailed {
                    page: number,
                    detail: "bitmap allocation failed".into(),
                });
            }
            visit(RasterPage {
                number,
                image: DynamicImage::new_rgb8(self.width, self.height),
            })?;
        }
        Ok(())
    }
}

/// Returns the scripted pages in order, then empty pages.
struct FakeOcr {
    pages: Vec<OcrPage>,
    settings_seen: Mutex<Vec<OcrSettings>>,
    refuse_session: bool,
    fail_on: Option<usize>,
    recognized: Arc<AtomicUsize>,
}

impl FakeOcr {
    fn scripted(pages: Vec<OcrPage>) -> Self {
        Self {
            pages,
            settings_seen: Mutex::new(Vec::new()),
            refuse_session: false,
            fail_on: None,
            recognized: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn new(pages: Vec<OcrPage>) -> Arc<Self> {
        Arc::new(Self::scripted(pages))
    }

    fn failing_on(page: usize, pages: Vec<OcrPage>) -> Arc<Self> {
        Arc::new(Self {
            fail_on: Some(page),
            ..Self::scripted(pages)
        })
    }

    fn refusing() -> Arc<Self> {
        Arc::new(Self {
            refuse_session: true,
            ..Self::scripted(vec![])
        })
    }
}

impl OcrEngine for FakeOcr {
    fn session(&self, settings: &OcrSettings) -> Result<Box<dyn OcrSession>, Layout2MdError> {
        self.settings_seen.lock().unwrap().push(settings.clone());
        if self.refuse_session {
            return Err(Layout2MdError::OcrUnavailable(format!(
                "no language data for '{}'",
                settings.languages
            )));
        }
        Ok(Box::new(FakeSession {
            pages: self.pages.clone(),
            next: 0,
            fail_on: self.fail_on,
            recognized: self.recognized.clone(),
        }))
    }
}

struct FakeSession {
    pages: Vec<OcrPage>,
    next: usize,
    fail_on: Option<usize>,
    recognized: Arc<AtomicUsize>,
}

impl OcrSession for FakeSession {
    fn recognize(&mut self, _image: &DynamicImage) -> Result<OcrPage, Layout2MdError> {
        self.recognized.fetch_add(1, Ordering::SeqCst);
        let number = self.next + 1;
        if self.fail_on == Some(number) {
            return Err(Layout2MdError::OcrFailed {
                page: number,
                detail: "recogniser returned no result".into(),
            });
        }
        let page = self.pages.get(self.next).cloned().unwrap_or_default();
        self.next += 1;
        Ok(page)
    }
}

/// Records progress events. Can cancel a token once a given page completes,
/// either on any path or only once OCR has started.
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
    cancel_after_page: Option<(usize, CancellationToken)>,
    cancel_after_ocr_page: Option<(usize, CancellationToken)>,
    in_ocr: AtomicBool,
}

impl ConversionProgressCallback for Recorder {
    fn on_conversion_start(&self, path: ConversionPath) {
        self.in_ocr
            .store(path != ConversionPath::NativePdf, Ordering::SeqCst);
        self.events.lock().unwrap().push(format!("start {path:?}"));
    }

    fn on_page_complete(&self, page_num: usize, lines: usize, words: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("page {page_num} {lines}/{words}"));
        if let Some((page, token)) = &self.cancel_after_page {
            if *page == page_num {
                token.cancel();
            }
        }
        if let Some((page, token)) = &self.cancel_after_ocr_page {
            if *page == page_num && self.in_ocr.load(Ordering::SeqCst) {
                token.cancel();
            }
        }
    }

    fn on_ocr_fallback(&self, native_words: usize, threshold: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("fallback {native_words}<{threshold}"));
    }

    fn on_conversion_complete(&self, path: ConversionPath, pages: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {path:?} {pages}"));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn pdf_file() -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(b"%PDF-1.4\n% fake body\n").unwrap();
    tmp
}

fn png_file(width: u32, height: u32) -> NamedTempFile {
    let tmp = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    DynamicImage::new_rgb8(width, height).save(tmp.path()).unwrap();
    tmp
}

fn word(text: &str, left: f64, bottom: f64, right: f64, top: f64) -> NativeWord {
    NativeWord {
        text: text.to_string(),
        bounds: PdfBounds::new(left, bottom, right, top),
    }
}

/// A US Letter page with `n` words laid out on one line.
fn letter_page(number: usize, n: usize) -> NativePage {
    NativePage {
        number,
        width: 612.0,
        height: 792.0,
        words: (0..n)
            .map(|i| {
                let left = 72.0 + 40.0 * i as f64;
                word(&format!("w{i}"), left, 700.0, left + 30.0, 712.0)
            })
            .collect(),
    }
}

fn ocr_page(lines: &[(&str, PixelRect)], words: &[(&str, PixelRect)]) -> OcrPage {
    OcrPage {
        lines: lines.iter().map(|(t, r)| OcrItem::new(*t, *r)).collect(),
        words: words.iter().map(|(t, r)| OcrItem::new(*t, *r)).collect(),
    }
}

fn scanned_page() -> OcrPage {
    ocr_page(
        &[("Scanned text", PixelRect::new(100, 200, 500, 40))],
        &[
            ("Scanned", PixelRect::new(100, 200, 250, 40)),
            ("text", PixelRect::new(380, 200, 220, 40)),
        ],
    )
}

fn converter(
    config: ConversionConfig,
    text: Arc<FakeText>,
    raster: Arc<FakeRaster>,
    ocr: Arc<FakeOcr>,
) -> Converter {
    Converter::new(config)
        .with_native_source(text)
        .with_rasterizer(raster)
        .with_ocr_engine(ocr)
}

fn assert_in_unit_square(b: &layout2md::BoundingBox) {
    assert!(b.x >= 0.0 && b.y >= 0.0, "{b:?}");
    assert!(b.x + b.width <= 1.0 + 1e-9, "{b:?}");
    assert!(b.y + b.height <= 1.0 + 1e-9, "{b:?}");
}

// ── Native path ──────────────────────────────────────────────────────────

#[tokio::test]
async fn hello_world_pdf_uses_native_text() {
    let pdf = pdf_file();
    let text = FakeText::new(vec![NativePage {
        number: 1,
        width: 612.0,
        height: 792.0,
        words: vec![
            word("Hello", 72.0, 700.0, 100.0, 712.0),
            word("world", 104.0, 700.0, 134.0, 712.0),
        ],
    }]);
    let raster = FakeRaster::new(1);
    let ocr = FakeOcr::new(vec![]);

    let result = converter(ConversionConfig::default(), text, raster.clone(), ocr)
        .convert(pdf.path(), "application/pdf")
        .await
        .unwrap();

    assert_eq!(result.source, ConversionPath::NativePdf);
    assert_eq!(result.lines.len(), 1);
    assert_eq!(result.lines[0].text, "Hello world");
    assert_eq!(result.lines[0].page, 1);
    assert_eq!(result.words.len(), 2);
    assert_eq!(result.markdown, "Hello world\n");
    assert_eq!(result.pages.len(), 1);
    assert_eq!((result.pages[0].width, result.pages[0].height), (612.0, 792.0));
    for b in result.lines.iter().map(|l| &l.bbox).chain(result.words.iter().map(|w| &w.bbox)) {
        assert_in_unit_square(b);
    }
    // PDF y is flipped: a word near the top of the page has a small y.
    assert!(result.words[0].bbox.y < 0.2);
    assert_eq!(raster.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn lines_follow_vertical_tolerance() {
    let pdf = pdf_file();
    // 0.01 of 792pt ≈ 7.9pt, 0.03 ≈ 23.8pt.
    let text = FakeText::new(vec![NativePage {
        number: 1,
        width: 612.0,
        height: 792.0,
        words: vec![
            word("first", 72.0, 700.0, 110.0, 712.0),
            word("same", 120.0, 692.1, 150.0, 704.1),
            word("second", 72.0, 668.3, 120.0, 680.3),
        ],
    }]);

    let result = converter(
        ConversionConfig::default(),
        text,
        FakeRaster::new(1),
        FakeOcr::new(vec![]),
    )
    .convert(pdf.path(), "application/pdf")
    .await
    .unwrap();

    let lines: Vec<_> = result.lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(lines, ["first same", "second"]);
}

#[tokio::test]
async fn multi_page_markdown_has_no_page_markers() {
    let pdf = pdf_file();
    let text = FakeText::new(vec![letter_page(1, 2), letter_page(2, 1)]);

    let config = ConversionConfig::builder()
        .normalize_markdown(false)
        .build()
        .unwrap();
    let result = converter(config, text, FakeRaster::new(2), FakeOcr::new(vec![]))
        .convert(pdf.path(), "application/pdf")
        .await
        .unwrap();

    assert_eq!(result.markdown, "w0 w1\nw0");
    assert_eq!(result.lines_on_page(2).count(), 1);
    assert_eq!(result.words_on_page(1).count(), 2);
}

// ── OCR fallback ─────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_text_layer_falls_back_to_ocr() {
    let pdf = pdf_file();
    let text = FakeText::new(vec![letter_page(1, 0)]);
    let ocr = FakeOcr::new(vec![scanned_page()]);

    let result = converter(ConversionConfig::default(), text, FakeRaster::new(1), ocr)
        .convert(pdf.path(), "application/pdf")
        .await
        .unwrap();

    assert_eq!(result.source, ConversionPath::OcrFallback);
    assert_eq!(result.markdown, "Scanned text\n");
    assert_eq!(result.lines.len(), 1);
    let words: Vec<_> = result.words.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(words, ["Scanned", "text"]);
    // Pages report the bitmap size, boxes are relative to it.
    assert_eq!((result.pages[0].width, result.pages[0].height), (1000.0, 2000.0));
    let b = &result.lines[0].bbox;
    assert!((b.x - 0.1).abs() < 1e-9 && (b.y - 0.1).abs() < 1e-9);
}

#[tokio::test]
async fn threshold_boundary() {
    let config = ConversionConfig::builder()
        .min_native_word_threshold(3)
        .build()
        .unwrap();

    for (native_words, expected) in [
        (2, ConversionPath::OcrFallback),
        (3, ConversionPath::NativePdf),
    ] {
        let pdf = pdf_file();
        let result = converter(
            config.clone(),
            FakeText::new(vec![letter_page(1, native_words)]),
            FakeRaster::new(1),
            FakeOcr::new(vec![scanned_page()]),
        )
        .convert(pdf.path(), "application/pdf")
        .await
        .unwrap();
        assert_eq!(result.source, expected, "{native_words} native words");
    }
}

#[tokio::test]
async fn threshold_counts_words_across_the_whole_document() {
    // 1 + 1 words over two pages meets a threshold of 2.
    let config = ConversionConfig::builder()
        .min_native_word_threshold(2)
        .build()
        .unwrap();
    let pdf = pdf_file();
    let result = converter(
        config,
        FakeText::new(vec![letter_page(1, 1), letter_page(2, 1)]),
        FakeRaster::new(2),
        FakeOcr::new(vec![]),
    )
    .convert(pdf.path(), "application/pdf")
    .await
    .unwrap();
    assert_eq!(result.source, ConversionPath::NativePdf);
    assert_eq!(result.pages.len(), 2);
}

#[tokio::test]
async fn ocr_session_receives_configured_settings() {
    let pdf = pdf_file();
    let ocr = FakeOcr::new(vec![scanned_page()]);
    let config = ConversionConfig::builder()
        .ocr_languages("deu+eng")
        .ocr_data_path("/opt/tessdata")
        .build()
        .unwrap();

    converter(config, FakeText::new(vec![letter_page(1, 0)]), FakeRaster::new(1), ocr.clone())
        .convert(pdf.path(), "application/pdf")
        .await
        .unwrap();

    let seen = ocr.settings_seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].languages, "deu+eng");
    assert_eq!(seen[0].data_path.as_deref(), Some(Path::new("/opt/tessdata")));
}

#[tokio::test]
async fn progress_events_follow_the_state_machine() {
    let pdf = pdf_file();
    let recorder = Arc::new(Recorder::default());
    let config = ConversionConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    converter(
        config,
        FakeText::new(vec![letter_page(1, 0)]),
        FakeRaster::new(1),
        FakeOcr::new(vec![scanned_page()]),
    )
    .convert(pdf.path(), "application/pdf")
    .await
    .unwrap();

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        [
            "start NativePdf",
            "page 1 0/0",
            "fallback 0<1",
            "start OcrFallback",
            "page 1 1/2",
            "done OcrFallback 1",
        ]
    );
}

// ── Image path ───────────────────────────────────────────────────────────

#[tokio::test]
async fn image_goes_straight_to_ocr() {
    let png = png_file(800, 400);
    let text = FakeText::new(vec![letter_page(1, 5)]);
    let ocr = FakeOcr::new(vec![ocr_page(
        &[("  Receipt  ", PixelRect::new(80, 40, 400, 40))],
        &[("Receipt", PixelRect::new(80, 40, 400, 40))],
    )]);

    let result = converter(ConversionConfig::default(), text.clone(), FakeRaster::new(1), ocr)
        .convert(png.path(), "image/png")
        .await
        .unwrap();

    assert_eq!(result.source, ConversionPath::ImageOcr);
    assert_eq!(result.markdown, "Receipt\n");
    assert_eq!(result.pages.len(), 1);
    assert_eq!(result.pages[0].number, 1);
    assert_eq!((result.pages[0].width, result.pages[0].height), (800.0, 400.0));
    assert!((result.lines[0].bbox.x - 0.1).abs() < 1e-9);
    assert_eq!(text.visited.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn undecodable_image_is_a_source_error() {
    let mut bogus = NamedTempFile::new().unwrap();
    bogus.write_all(b"this is not a picture").unwrap();

    let err = converter(
        ConversionConfig::default(),
        FakeText::new(vec![]),
        FakeRaster::new(0),
        FakeOcr::new(vec![]),
    )
    .convert(bogus.path(), "image/jpeg")
    .await
    .unwrap_err();

    assert!(matches!(err, Layout2MdError::UnreadableImage { .. }), "{err}");
    assert_eq!(err.kind(), ErrorKind::SourceRead);
}

// ── Failures ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_mime_touches_nothing() {
    let text = FakeText::new(vec![letter_page(1, 3)]);
    let err = converter(
        ConversionConfig::default(),
        text.clone(),
        FakeRaster::new(1),
        FakeOcr::new(vec![]),
    )
    .convert("/this/path/does/not/exist.txt", "text/plain")
    .await
    .unwrap_err();

    assert!(matches!(err, Layout2MdError::UnsupportedFormat { ref mime } if mime == "text/plain"));
    assert_eq!(text.visited.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_file_is_reported() {
    let err = converter(
        ConversionConfig::default(),
        FakeText::new(vec![]),
        FakeRaster::new(0),
        FakeOcr::new(vec![]),
    )
    .convert("/this/path/does/not/exist.pdf", "application/pdf")
    .await
    .unwrap_err();
    assert!(matches!(err, Layout2MdError::FileNotFound { .. }));
}

#[tokio::test]
async fn rasteriser_error_aborts_without_partial_result() {
    let pdf = pdf_file();
    let recorder = Arc::new(Recorder::default());
    let config = ConversionConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let err = converter(
        config,
        FakeText::new(vec![letter_page(1, 0)]),
        FakeRaster::failing_on(2),
        FakeOcr::new(vec![scanned_page(), scanned_page(), scanned_page()]),
    )
    .convert(pdf.path(), "application/pdf")
    .await
    .unwrap_err();

    assert!(matches!(err, Layout2MdError::RasterisationFailed { page: 2, .. }));
    assert_eq!(err.kind(), ErrorKind::Extraction);
    let events = recorder.events.lock().unwrap();
    assert!(!events.iter().any(|e| e.starts_with("done")), "{events:?}");
}

#[tokio::test]
async fn zero_sized_page_is_an_extraction_error() {
    let pdf = pdf_file();
    let mut page = letter_page(1, 2);
    page.width = 0.0;

    let err = converter(
        ConversionConfig::default(),
        FakeText::new(vec![page]),
        FakeRaster::new(1),
        FakeOcr::new(vec![]),
    )
    .convert(pdf.path(), "application/pdf")
    .await
    .unwrap_err();

    assert!(matches!(err, Layout2MdError::InvalidPageSize { page: 1, .. }), "{err}");
    assert_eq!(err.kind(), ErrorKind::Extraction);
}

#[tokio::test]
async fn ocr_page_error_aborts_without_partial_result() {
    let pdf = pdf_file();
    let recorder = Arc::new(Recorder::default());
    let config = ConversionConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let ocr = FakeOcr::failing_on(2, vec![scanned_page(), scanned_page(), scanned_page()]);

    let err = converter(
        config,
        FakeText::new(vec![letter_page(1, 0)]),
        FakeRaster::new(3),
        ocr.clone(),
    )
    .convert(pdf.path(), "application/pdf")
    .await
    .unwrap_err();

    assert!(matches!(err, Layout2MdError::OcrFailed { page: 2, .. }), "{err}");
    assert_eq!(err.kind(), ErrorKind::Extraction);
    assert_eq!(ocr.recognized.load(Ordering::SeqCst), 2);
    let events = recorder.events.lock().unwrap();
    assert!(events.contains(&"page 1 1/2".to_string()), "{events:?}");
    assert!(!events.iter().any(|e| e.starts_with("done")), "{events:?}");
}

#[tokio::test]
async fn ocr_engine_that_cannot_start_fails_both_ocr_paths() {
    let pdf = pdf_file();
    let png = png_file(200, 100);

    for (path, mime) in [(pdf.path(), "application/pdf"), (png.path(), "image/png")] {
        let raster = FakeRaster::new(1);
        let err = converter(
            ConversionConfig::default(),
            FakeText::new(vec![letter_page(1, 0)]),
            raster.clone(),
            FakeOcr::refusing(),
        )
        .convert(path, mime)
        .await
        .unwrap_err();

        assert!(matches!(err, Layout2MdError::OcrUnavailable(_)), "{mime}: {err}");
        assert_eq!(err.kind(), ErrorKind::Extraction);
        assert_eq!(raster.calls.load(Ordering::SeqCst), 0, "{mime}");
    }
}

// ── Cancellation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn cancellation_stops_at_next_page_boundary() {
    let pdf = pdf_file();
    let token = CancellationToken::new();
    let recorder = Arc::new(Recorder {
        cancel_after_page: Some((1, token.clone())),
        ..Recorder::default()
    });
    let config = ConversionConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let text = FakeText::new(vec![letter_page(1, 2), letter_page(2, 2), letter_page(3, 2)]);

    let err = converter(config, text.clone(), FakeRaster::new(3), FakeOcr::new(vec![]))
        .convert_with_cancellation(pdf.path(), "application/pdf", &token)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(text.visited.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancellation_during_ocr_fallback_stops_after_one_page() {
    let pdf = pdf_file();
    let token = CancellationToken::new();
    let recorder = Arc::new(Recorder {
        cancel_after_ocr_page: Some((1, token.clone())),
        ..Recorder::default()
    });
    let config = ConversionConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let text = FakeText::new(vec![letter_page(1, 0), letter_page(2, 0), letter_page(3, 0)]);
    let ocr = FakeOcr::new(vec![scanned_page(), scanned_page(), scanned_page()]);

    let err = converter(config, text.clone(), FakeRaster::new(3), ocr.clone())
        .convert_with_cancellation(pdf.path(), "application/pdf", &token)
        .await
        .unwrap_err();

    assert!(err.is_cancelled(), "{err}");
    assert_eq!(text.visited.load(Ordering::SeqCst), 3);
    assert_eq!(ocr.recognized.load(Ordering::SeqCst), 1);
    let events = recorder.events.lock().unwrap();
    assert!(!events.iter().any(|e| e.starts_with("done")), "{events:?}");
}

#[tokio::test]
async fn cancellation_during_image_ocr_discards_the_page() {
    let png = png_file(200, 100);
    let token = CancellationToken::new();
    let recorder = Arc::new(Recorder {
        cancel_after_ocr_page: Some((1, token.clone())),
        ..Recorder::default()
    });
    let config = ConversionConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let ocr = FakeOcr::new(vec![scanned_page()]);

    let err = converter(config, FakeText::new(vec![]), FakeRaster::new(0), ocr.clone())
        .convert_with_cancellation(png.path(), "image/png", &token)
        .await
        .unwrap_err();

    assert!(err.is_cancelled(), "{err}");
    assert_eq!(ocr.recognized.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancelled_token_prevents_any_work() {
    let pdf = pdf_file();
    let token = CancellationToken::new();
    token.cancel();
    let text = FakeText::new(vec![letter_page(1, 2)]);

    let err = converter(
        ConversionConfig::default(),
        text.clone(),
        FakeRaster::new(1),
        FakeOcr::new(vec![]),
    )
    .convert_with_cancellation(pdf.path(), "application/pdf", &token)
    .await
    .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(text.visited.load(Ordering::SeqCst), 0);
}

// ── Concurrency & entry points ───────────────────────────────────────────

#[tokio::test]
async fn one_converter_serves_concurrent_calls() {
    let pdf_a = pdf_file();
    let pdf_b = pdf_file();
    let shared = converter(
        ConversionConfig::default(),
        FakeText::new(vec![letter_page(1, 3)]),
        FakeRaster::new(1),
        FakeOcr::new(vec![]),
    );

    let (a, b) = tokio::join!(
        shared.convert(pdf_a.path(), "application/pdf"),
        shared.convert(pdf_b.path(), "application/pdf"),
    );
    assert_eq!(a.unwrap(), b.unwrap());
}

#[tokio::test]
async fn bytes_are_checked_like_files() {
    let config = ConversionConfig::default();

    let err = convert_from_bytes(b"plain text", "text/plain", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, Layout2MdError::UnsupportedFormat { .. }));

    let err = convert_from_bytes(b"GIF89a....", "application/pdf", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, Layout2MdError::NotAPdf { .. }), "{err}");
}
