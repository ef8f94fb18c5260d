//! Conversion entry points and the orchestrating state machine.
//!
//! ```text
//! Start ──▶ NativePdf ──(enough words)──────────────▶ Done
//!   │           └──(too few words)──▶ OcrFallback ──▶ Done
//!   └──────▶ ImageOcr ───────────────────────────────▶ Done
//! ```
//!
//! The MIME type picks the first state. A PDF is always read through its
//! native text layer first; the whole document falls back to OCR when the
//! word tally is below `min_native_word_threshold`. Any collaborator error or
//! cancellation ends the conversion without a partial result.
//!
//! All work after argument checks runs inside `spawn_blocking`: pdfium and
//! Tesseract are synchronous C libraries.

use crate::cancel::CancellationToken;
use crate::config::ConversionConfig;
use crate::error::Layout2MdError;
use crate::output::{ConversionPath, ConversionResult, Line, Page, Word};
use crate::pipeline::assemble::assemble;
use crate::pipeline::geometry::{normalize, valid_page_size};
use crate::pipeline::input::{resolve_local, validate_path, SourceKind};
use crate::pipeline::lines::build_lines;
use crate::pipeline::native::{NativeTextSource, PdfiumTextSource};
use crate::pipeline::ocr::{collect_page, default_ocr_engine, OcrEngine, OcrSession, OcrSettings};
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use crate::pipeline::select::{select_source, SourceDecision};
use crate::progress::ConversionProgressCallback;
use image::DynamicImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Converts documents with a fixed configuration and set of collaborators.
///
/// A `Converter` holds no mutable state and can be shared between tasks;
/// every call opens and releases its own document, bitmaps and OCR session.
#[derive(Clone)]
pub struct Converter {
    config: ConversionConfig,
    native: Arc<dyn NativeTextSource>,
    rasterizer: Arc<dyn Rasterizer>,
    ocr: Arc<dyn OcrEngine>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Pages, lines and words gathered by one conversion path.
struct Extraction {
    source: ConversionPath,
    pages: Vec<Page>,
    lines: Vec<Line>,
    words: Vec<Word>,
}

impl Extraction {
    fn new(source: ConversionPath) -> Self {
        Self {
            source,
            pages: Vec::new(),
            lines: Vec::new(),
            words: Vec::new(),
        }
    }
}

impl Converter {
    /// A converter using pdfium and the default OCR engine.
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            native: Arc::new(PdfiumTextSource),
            rasterizer: Arc::new(PdfiumRasterizer),
            ocr: default_ocr_engine(),
        }
    }

    pub fn with_native_source(mut self, native: Arc<dyn NativeTextSource>) -> Self {
        self.native = native;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn with_ocr_engine(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = ocr;
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert the document at `path`, whose content type is `mime`.
    pub async fn convert(
        &self,
        path: impl AsRef<Path>,
        mime: &str,
    ) -> Result<ConversionResult, Layout2MdError> {
        self.convert_with_cancellation(path, mime, &CancellationToken::new())
            .await
    }

    /// Like [`Converter::convert`], stopping at the next page boundary once
    /// `token` is cancelled.
    pub async fn convert_with_cancellation(
        &self,
        path: impl AsRef<Path>,
        mime: &str,
        token: &CancellationToken,
    ) -> Result<ConversionResult, Layout2MdError> {
        let path = path.as_ref();
        // Cheap checks stay on the async side so bad arguments never cost a
        // blocking thread.
        validate_path(path)?;
        token.check()?;
        SourceKind::from_mime(mime)?;

        let this = self.clone();
        let path = path.to_path_buf();
        let mime = mime.to_string();
        let token = token.clone();

        tokio::task::spawn_blocking(move || this.convert_blocking(&path, &mime, &token))
            .await
            .map_err(|e| Layout2MdError::Internal(format!("Conversion task panicked: {}", e)))?
    }

    /// Synchronous conversion on the calling thread.
    pub fn convert_blocking(
        &self,
        path: &Path,
        mime: &str,
        token: &CancellationToken,
    ) -> Result<ConversionResult, Layout2MdError> {
        let total_start = Instant::now();

        validate_path(path)?;
        token.check()?;
        let kind = SourceKind::from_mime(mime)?;
        let path = resolve_local(path, kind)?;
        info!("Starting conversion: {} ({})", path.display(), mime);

        let extraction = match kind {
            SourceKind::Pdf => self.convert_pdf(&path, token)?,
            SourceKind::Image => self.convert_image(&path, token)?,
        };

        let markdown = assemble(&extraction.lines, self.config.normalize_markdown);

        info!(
            "Conversion complete via {}: {} pages, {} lines, {} words, {}ms",
            extraction.source,
            extraction.pages.len(),
            extraction.lines.len(),
            extraction.words.len(),
            total_start.elapsed().as_millis()
        );
        self.notify(|cb| cb.on_conversion_complete(extraction.source, extraction.pages.len()));

        Ok(ConversionResult {
            markdown,
            pages: extraction.pages,
            lines: extraction.lines,
            words: extraction.words,
            source: extraction.source,
        })
    }

    // ── PDF ──────────────────────────────────────────────────────────────

    fn convert_pdf(
        &self,
        path: &Path,
        token: &CancellationToken,
    ) -> Result<Extraction, Layout2MdError> {
        self.notify(|cb| cb.on_conversion_start(ConversionPath::NativePdf));
        let native_start = Instant::now();
        let native = self.extract_native(path, token)?;

        let threshold = self.config.min_native_word_threshold;
        let word_count = native.words.len();
        debug!(
            "Native text layer: {} words on {} pages in {}ms",
            word_count,
            native.pages.len(),
            native_start.elapsed().as_millis()
        );

        match select_source(word_count, threshold) {
            SourceDecision::NativeAccepted => Ok(native),
            SourceDecision::OcrRequired => {
                info!(
                    "Native text layer has {} words (threshold {}), falling back to OCR",
                    word_count, threshold
                );
                self.notify(|cb| cb.on_ocr_fallback(word_count, threshold));
                drop(native);
                self.ocr_pdf(path, token)
            }
        }
    }

    fn extract_native(
        &self,
        path: &Path,
        token: &CancellationToken,
    ) -> Result<Extraction, Layout2MdError> {
        let mut out = Extraction::new(ConversionPath::NativePdf);

        self.native
            .extract_pages(path, self.config.password.as_deref(), &mut |page| {
                if !valid_page_size(page.width, page.height) {
                    return Err(Layout2MdError::InvalidPageSize {
                        page: page.number,
                        width: page.width,
                        height: page.height,
                    });
                }

                let words: Vec<Word> = page
                    .words
                    .into_iter()
                    .map(|w| Word {
                        page: page.number,
                        text: w.text,
                        bbox: normalize(w.bounds, page.width, page.height),
                    })
                    .collect();
                let lines = build_lines(page.number, &words);

                debug!(
                    "Page {}: {} words → {} lines",
                    page.number,
                    words.len(),
                    lines.len()
                );
                self.notify(|cb| cb.on_page_complete(page.number, lines.len(), words.len()));

                out.pages.push(Page {
                    number: page.number,
                    width: page.width,
                    height: page.height,
                });
                out.lines.extend(lines);
                out.words.extend(words);

                token.check()
            })?;

        Ok(out)
    }

    fn ocr_pdf(&self, path: &Path, token: &CancellationToken) -> Result<Extraction, Layout2MdError> {
        self.notify(|cb| cb.on_conversion_start(ConversionPath::OcrFallback));
        let ocr_start = Instant::now();
        let mut out = Extraction::new(ConversionPath::OcrFallback);
        let mut session = self.ocr.session(&self.ocr_settings())?;

        self.rasterizer.rasterize(
            path,
            self.config.pdf_raster_dpi,
            self.config.password.as_deref(),
            &mut |raster| {
                self.ocr_page(session.as_mut(), raster.number, &raster.image, &mut out)?;
                token.check()
            },
        )?;

        debug!(
            "OCR fallback: {} pages in {}ms",
            out.pages.len(),
            ocr_start.elapsed().as_millis()
        );
        Ok(out)
    }

    // ── Image ────────────────────────────────────────────────────────────

    fn convert_image(
        &self,
        path: &Path,
        token: &CancellationToken,
    ) -> Result<Extraction, Layout2MdError> {
        self.notify(|cb| cb.on_conversion_start(ConversionPath::ImageOcr));
        let image = decode_image(path)?;
        let mut session = self.ocr.session(&self.ocr_settings())?;

        let mut out = Extraction::new(ConversionPath::ImageOcr);
        self.ocr_page(session.as_mut(), 1, &image, &mut out)?;
        token.check()?;
        Ok(out)
    }

    // ── Shared ───────────────────────────────────────────────────────────

    fn ocr_page(
        &self,
        session: &mut dyn OcrSession,
        number: usize,
        image: &DynamicImage,
        out: &mut Extraction,
    ) -> Result<(), Layout2MdError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(Layout2MdError::InvalidPageSize {
                page: number,
                width: f64::from(width),
                height: f64::from(height),
            });
        }

        let ocr = session.recognize(image)?;
        let (lines, words) = collect_page(number, &ocr, width, height);
        debug!(
            "Page {}: OCR {} lines, {} words ({}x{} px)",
            number,
            lines.len(),
            words.len(),
            width,
            height
        );
        self.notify(|cb| cb.on_page_complete(number, lines.len(), words.len()));

        out.pages.push(Page {
            number,
            width: f64::from(width),
            height: f64::from(height),
        });
        out.lines.extend(lines);
        out.words.extend(words);
        Ok(())
    }

    fn ocr_settings(&self) -> OcrSettings {
        OcrSettings {
            languages: self.config.ocr_languages.clone(),
            data_path: self.config.ocr_data_path.clone(),
        }
    }

    fn notify(&self, f: impl FnOnce(&dyn ConversionProgressCallback)) {
        if let Some(ref cb) = self.config.progress_callback {
            f(cb.as_ref());
        }
    }
}

fn decode_image(path: &Path) -> Result<DynamicImage, Layout2MdError> {
    let unreadable = |detail: String| Layout2MdError::UnreadableImage {
        path: path.to_path_buf(),
        detail,
    };

    image::ImageReader::open(path)
        .map_err(|e| unreadable(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| unreadable(e.to_string()))?
        .decode()
        .map_err(|e| unreadable(e.to_string()))
}

// ── Free functions ───────────────────────────────────────────────────────

/// Convert a PDF or image to Markdown.
///
/// # Example
/// ```rust,no_run
/// use layout2md::{convert, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let result = convert("scan.pdf", "application/pdf", &ConversionConfig::default()).await?;
/// println!("{}", result.markdown);
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    path: impl AsRef<Path>,
    mime: &str,
    config: &ConversionConfig,
) -> Result<ConversionResult, Layout2MdError> {
    Converter::new(config.clone()).convert(path, mime).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    path: impl AsRef<Path>,
    mime: &str,
    config: &ConversionConfig,
) -> Result<ConversionResult, Layout2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Layout2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(path, mime, config))
}

/// Convert a document and write its Markdown to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    path: impl AsRef<Path>,
    mime: &str,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionResult, Layout2MdError> {
    let result = convert(path, mime, config).await?;
    write_markdown(output_path.as_ref(), &result.markdown).await?;
    Ok(result)
}

/// Convert document bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed when the
/// call returns.
pub async fn convert_from_bytes(
    bytes: &[u8],
    mime: &str,
    config: &ConversionConfig,
) -> Result<ConversionResult, Layout2MdError> {
    // Fail before touching the disk.
    SourceKind::from_mime(mime)?;

    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| Layout2MdError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Layout2MdError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_path_buf();
    // `tmp` is dropped (and the file deleted) when `convert` returns
    convert(&path, mime, config).await
}

/// Write `contents` to `path` through a sibling temp file and a rename, so
/// readers never see a half-written file. Parent directories are created.
pub async fn write_markdown(path: &Path, contents: &str) -> Result<(), Layout2MdError> {
    let write_err = |source| Layout2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path: PathBuf = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}
