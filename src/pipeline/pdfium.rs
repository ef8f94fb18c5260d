//! pdfium binding and document loading shared by the text source and the
//! rasteriser.
//!
//! pdfium-render loads the pdfium shared library at runtime. Each conversion
//! binds its own [`Pdfium`] instance on the blocking thread that uses it;
//! the instance and every document opened through it are dropped when that
//! call returns, on success and on error alike.

use crate::error::Layout2MdError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing at a pdfium library file or its directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// PDF user space is 72 points per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Bind to pdfium: `PDFIUM_LIB_PATH` first, then the working directory, then
/// the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, Layout2MdError> {
    if let Ok(configured) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        if !configured.is_empty() {
            let path = PathBuf::from(&configured);
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            return Pdfium::bind_to_library(&lib)
                .map(Pdfium::new)
                .map_err(|e| {
                    Layout2MdError::PdfiumBindingFailed(format!("{}: {:?}", lib.display(), e))
                });
        }
    }

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Layout2MdError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Open a PDF, mapping pdfium's errors to source-read errors.
pub fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Layout2MdError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Layout2MdError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Layout2MdError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            Layout2MdError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}
