//! Configuration types for document conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`] or taken from `Default`.

use crate::error::Layout2MdError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Lowest accepted rasterisation DPI.
pub const MIN_RASTER_DPI: u32 = 72;
/// Highest accepted rasterisation DPI.
pub const MAX_RASTER_DPI: u32 = 600;

/// Configuration for a conversion.
///
/// # Example
/// ```rust
/// use layout2md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .ocr_languages("ita+eng")
///     .pdf_raster_dpi(200)
///     .min_native_word_threshold(5)
///     .build()
///     .unwrap();
/// assert_eq!(config.pdf_raster_dpi, 200);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Location of the Tesseract language data (`tessdata`). Default: None,
    /// which lets the engine use `TESSDATA_PREFIX` or its compiled-in path.
    pub ocr_data_path: Option<PathBuf>,

    /// Tesseract language code(s), `+`-separated. Default: `"eng"`.
    pub ocr_languages: String,

    /// DPI used when rasterising PDF pages for the OCR fallback. Default: 300.
    ///
    /// Tesseract is tuned for ~300 DPI glyphs; lower values trade accuracy
    /// for speed on large pages.
    pub pdf_raster_dpi: u32,

    /// Minimum number of native words (whole document) required to keep the
    /// PDF text layer. Below it the document is re-read with OCR. Default: 1.
    ///
    /// Raise it to force OCR on PDFs whose only text is, for example, a
    /// watermark or a scanner's page stamp.
    pub min_native_word_threshold: usize,

    /// Pass the assembled markdown through the normaliser. Default: true.
    pub normalize_markdown: bool,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Receives per-page progress events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            ocr_data_path: None,
            ocr_languages: "eng".to_string(),
            pdf_raster_dpi: 300,
            min_native_word_threshold: 1,
            normalize_markdown: true,
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("ocr_data_path", &self.ocr_data_path)
            .field("ocr_languages", &self.ocr_languages)
            .field("pdf_raster_dpi", &self.pdf_raster_dpi)
            .field("min_native_word_threshold", &self.min_native_word_threshold)
            .field("normalize_markdown", &self.normalize_markdown)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn ocr_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ocr_data_path = Some(path.into());
        self
    }

    pub fn ocr_languages(mut self, languages: impl Into<String>) -> Self {
        self.config.ocr_languages = languages.into();
        self
    }

    pub fn pdf_raster_dpi(mut self, dpi: u32) -> Self {
        self.config.pdf_raster_dpi = dpi;
        self
    }

    pub fn min_native_word_threshold(mut self, n: usize) -> Self {
        self.config.min_native_word_threshold = n;
        self
    }

    pub fn normalize_markdown(mut self, v: bool) -> Self {
        self.config.normalize_markdown = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Layout2MdError> {
        let c = &self.config;
        if !(MIN_RASTER_DPI..=MAX_RASTER_DPI).contains(&c.pdf_raster_dpi) {
            return Err(Layout2MdError::InvalidConfig(format!(
                "DPI must be {MIN_RASTER_DPI}–{MAX_RASTER_DPI}, got {}",
                c.pdf_raster_dpi
            )));
        }
        if c.ocr_languages.trim().is_empty() {
            return Err(Layout2MdError::InvalidConfig(
                "OCR languages must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
