//! Input validation: path and MIME type checks before any document is opened.
//!
//! The MIME type alone decides the conversion path, and it is checked before
//! the file system is touched, so an unsupported type fails without I/O.
//! Only then is the path checked for existence and readability, and PDFs for
//! their `%PDF` magic bytes.

use crate::error::Layout2MdError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Document family, derived from the caller's MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Image,
}

impl SourceKind {
    /// Map a MIME type to a document family.
    ///
    /// Matching ignores ASCII case, surrounding whitespace and parameters
    /// (`application/pdf; charset=binary`).
    pub fn from_mime(mime: &str) -> Result<Self, Layout2MdError> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence == "application/pdf" {
            Ok(SourceKind::Pdf)
        } else if essence
            .strip_prefix("image/")
            .is_some_and(|subtype| !subtype.is_empty())
        {
            Ok(SourceKind::Image)
        } else {
            Err(Layout2MdError::UnsupportedFormat {
                mime: mime.to_string(),
            })
        }
    }
}

/// Reject empty or whitespace-only paths.
pub fn validate_path(path: &Path) -> Result<(), Layout2MdError> {
    if path.to_string_lossy().trim().is_empty() {
        return Err(Layout2MdError::InvalidArgument {
            reason: "path is required".into(),
        });
    }
    Ok(())
}

/// Check that `path` exists and is readable; for PDFs also verify the magic
/// bytes.
pub fn resolve_local(path: &Path, kind: SourceKind) -> Result<PathBuf, Layout2MdError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(Layout2MdError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            if kind == SourceKind::Pdf {
                let mut magic = [0u8; 4];
                if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                    return Err(Layout2MdError::NotAPdf { path, magic });
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Layout2MdError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Layout2MdError::FileNotFound { path });
        }
    }

    debug!("Resolved local {:?}: {}", kind, path.display());
    Ok(path)
}

/// Guess a MIME type from the file's leading bytes.
///
/// Returns `None` when the content is not recognised.
pub fn detect_mime(path: &Path) -> Result<Option<&'static str>, Layout2MdError> {
    let mut f = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Layout2MdError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Layout2MdError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let mut buffer = [0u8; 8192];
    let n = f.read(&mut buffer).map_err(|e| Layout2MdError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(infer::get(&buffer[..n]).map(|kind| kind.mime_type()))
}
