//! Pipeline stages for layout reconstruction.
//!
//! Each submodule implements one step. The three collaborator seams
//! ([`native::NativeTextSource`], [`render::Rasterizer`], [`ocr::OcrEngine`])
//! are traits so tests can run the whole pipeline without pdfium or
//! Tesseract.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ native ──▶ geometry ──▶ lines ──▶ select ──┬──▶ assemble ──▶ postprocess
//!                                                      │        ▲
//!                                                      └─▶ render ──▶ ocr
//! ```
//!
//! 1. [`input`]    resolve the MIME type and check the file
//! 2. [`native`]   read words from the PDF text layer (pdfium)
//! 3. [`geometry`] map PDF points and pixels into unit-square page space
//! 4. [`lines`]    group words into lines with a rolling vertical tolerance
//! 5. [`select`]   accept the text layer or fall back to OCR
//! 6. [`render`] / [`ocr`] rasterise pages and recognise lines and words
//! 7. [`assemble`] join line texts, optionally through [`postprocess`]

pub mod assemble;
pub mod encode;
pub mod geometry;
pub mod input;
pub mod lines;
pub mod native;
pub mod ocr;
pub mod pdfium;
pub mod postprocess;
pub mod render;
pub mod select;
