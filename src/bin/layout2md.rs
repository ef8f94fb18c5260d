//! CLI binary for layout2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use layout2md::{
    detect_mime, write_markdown, CancellationToken, ConversionConfig, ConversionPath,
    ConversionProgressCallback, Converter, ProgressCallback,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner with a running page count. The total is unknown up front: pdfium
/// is only opened on the blocking thread.
struct CliProgressCallback {
    bar: ProgressBar,
    pages: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            pages: AtomicUsize::new(0),
        })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, path: ConversionPath) {
        self.pages.store(0, Ordering::SeqCst);
        self.bar.set_prefix(match path {
            ConversionPath::NativePdf => "Reading text",
            ConversionPath::OcrFallback | ConversionPath::ImageOcr => "Running OCR",
        });
        self.bar.println(format!("{} {}", cyan("◆"), bold(&path.to_string())));
    }

    fn on_page_complete(&self, page_num: usize, lines: usize, words: usize) {
        let done = self.pages.fetch_add(1, Ordering::SeqCst) + 1;
        self.bar.set_message(format!("{done} pages"));
        self.bar.println(format!(
            "  {} Page {:>3}  {}",
            green("✓"),
            page_num,
            dim(&format!("{lines:>4} lines {words:>5} words")),
        ));
    }

    fn on_ocr_fallback(&self, native_words: usize, threshold: usize) {
        self.bar.println(format!(
            "  {} text layer has {native_words} words (need {threshold}), switching to OCR",
            cyan("⚠")
        ));
    }

    fn on_conversion_complete(&self, path: ConversionPath, pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages converted ({})",
            green("✔"),
            bold(&pages.to_string()),
            path
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # PDF to Markdown on stdout (MIME type sniffed from the file)
  layout2md document.pdf

  # Scanned image, German and English
  layout2md --languages deu+eng scan.png -o scan.md

  # Words and lines with bounding boxes
  layout2md --json document.pdf > layout.json

  # Force OCR unless the text layer has at least 50 words
  layout2md --min-words 50 --dpi 400 mixed.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  TESSDATA_PREFIX         Tesseract language data directory
  RUST_LOG                Log filter, overrides -v / -q

SETUP:
  pdfium is loaded at runtime from PDFIUM_LIB_PATH, the working directory,
  or the system library path. OCR needs a build with `--features tesseract`
  and the Tesseract language data for every language requested.
"#;

/// Convert PDFs and images to Markdown with word and line bounding boxes.
#[derive(Parser, Debug)]
#[command(
    name = "layout2md",
    version,
    about = "Convert PDFs and images to Markdown with word and line bounding boxes",
    long_about = "Convert PDF documents and raster images to Markdown. PDFs are read through \
their embedded text layer; when it holds too few words the pages are rasterised and sent \
through OCR. Every word and line comes with a bounding box in unit-square page coordinates.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF or image file.
    input: PathBuf,

    /// MIME type of the input (application/pdf, image/png, …). Sniffed when omitted.
    #[arg(long, env = "LAYOUT2MD_MIME")]
    mime: Option<String>,

    /// Write Markdown to this file instead of stdout.
    #[arg(short, long, env = "LAYOUT2MD_OUTPUT")]
    output: Option<PathBuf>,

    /// Output the full result (markdown, pages, lines, words) as JSON.
    #[arg(long, env = "LAYOUT2MD_JSON")]
    json: bool,

    /// Tesseract language data directory.
    #[arg(long, env = "TESSDATA_PREFIX")]
    ocr_data_path: Option<PathBuf>,

    /// OCR languages joined by '+', e.g. eng+deu.
    #[arg(long, env = "LAYOUT2MD_LANGUAGES", default_value = "eng")]
    languages: String,

    /// Rasterisation DPI for the OCR fallback (72–600).
    #[arg(long, env = "LAYOUT2MD_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Minimum native words before a PDF falls back to OCR.
    #[arg(long, env = "LAYOUT2MD_MIN_WORDS", default_value_t = 1)]
    min_words: usize,

    /// Emit line text verbatim, without Markdown normalisation.
    #[arg(long, env = "LAYOUT2MD_NO_NORMALIZE")]
    no_normalize: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "LAYOUT2MD_PASSWORD")]
    password: Option<String>,

    /// Disable progress spinner.
    #[arg(long, env = "LAYOUT2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "LAYOUT2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "LAYOUT2MD_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would interleave with the spinner, so they are dropped while
    // it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Resolve MIME type ────────────────────────────────────────────────
    let mime = match cli.mime.clone() {
        Some(m) => m,
        None => detect_mime(&cli.input)
            .with_context(|| format!("Failed to read {}", cli.input.display()))?
            .map(str::to_string)
            .with_context(|| {
                format!(
                    "Cannot tell the type of {}; pass --mime",
                    cli.input.display()
                )
            })?,
    };

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Ctrl-C → cancel at the next page boundary ────────────────────────
    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let result = Converter::new(config)
        .convert_with_cancellation(&cli.input, &mime, &token)
        .await
        .context("Conversion failed")?;

    if let Some(ref output_path) = cli.output {
        write_markdown(output_path, &result.markdown)
            .await
            .context("Failed to write output")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} pages  {} lines  →  {}",
                green("✔"),
                result.pages.len(),
                result.lines.len(),
                bold(&output_path.display().to_string()),
            );
        }
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.output.is_none() {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(result.markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !result.markdown.is_empty() && !result.markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet && !show_progress && !cli.json {
        eprintln!(
            "Converted {} pages via {} ({} lines, {} words)",
            result.pages.len(),
            result.source,
            result.lines.len(),
            result.words.len()
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .ocr_languages(cli.languages.clone())
        .pdf_raster_dpi(cli.dpi)
        .min_native_word_threshold(cli.min_words)
        .normalize_markdown(!cli.no_normalize);

    if let Some(ref path) = cli.ocr_data_path {
        builder = builder.ocr_data_path(path.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
