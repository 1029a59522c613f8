//! Error types for the pdf-split-worker library.
//!
//! Two layers of failure exist:
//!
//! * [`SplitError`] — the concrete cause: a missing source, a PDF that cannot
//!   be parsed, a write that failed. Housekeeping operations (listing,
//!   clearing, inbox deletion) return it directly as `Err(SplitError)`.
//!
//! * [`FaultKind`] — the coarse classification reported inside a
//!   [`crate::output::JobResult`]. Job processing never returns `Err`; a fault
//!   is contained in that job's result together with the files written
//!   before it happened.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf-split-worker library.
#[derive(Debug, Error)]
pub enum SplitError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No source document exists for the job in the inbox.
    #[error("File not found: '{path}' (job '{job_id}')")]
    SourceNotFound { job_id: String, path: PathBuf },

    /// A job id, year, identifier or filename is not a single path component.
    #[error("Invalid name '{name}': must be a single path component")]
    InvalidName { name: String },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// Text extraction or single-page serialisation failed.
    ///
    /// `page` is 1-indexed; `None` when the document itself could not be
    /// opened.
    #[error("{}", extraction_message(.page, .detail))]
    Extraction { page: Option<usize>, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write an output document.
    #[error("Failed to write output file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other filesystem failure (read, list, delete, create).
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn extraction_message(page: &Option<usize>, detail: &str) -> String {
    match page {
        Some(p) => format!("Extraction failed for page {p}: {detail}"),
        None => format!("Extraction failed: {detail}"),
    }
}

impl SplitError {
    /// Classify this error for reporting in a job result.
    pub fn kind(&self) -> FaultKind {
        match self {
            SplitError::SourceNotFound { .. } | SplitError::InvalidName { .. } => {
                FaultKind::NotFound
            }
            SplitError::NotAPdf { .. }
            | SplitError::Extraction { .. }
            | SplitError::PdfiumBindingFailed(_) => FaultKind::ExtractionFault,
            SplitError::Write { .. } | SplitError::Io { .. } => FaultKind::WriteFault,
            SplitError::InvalidConfig(_) | SplitError::Internal(_) => FaultKind::Internal,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SplitError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Coarse fault taxonomy carried by a failed [`crate::output::JobResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FaultKind {
    /// Source document absent (or the job id cannot name one).
    NotFound,
    /// The PDF could not be opened, read, or split.
    ExtractionFault,
    /// An output document could not be written.
    WriteFault,
    /// Anything else.
    Internal,
}
