//! Page source: one pass over a batch yielding (text, single-page PDF) pairs.
//!
//! Text extraction and page extraction happen page by page on the same open
//! document, so the page count the classifier sees is always the page count
//! the writer sees.
//!
//! The pass is pushed into a [`PageSink`] rather than collected: the splitter
//! writes each page before the next is extracted, so a fault on page N leaves
//! pages 1..N-1 on disk and reported.
//!
//! ## Why a trait?
//!
//! [`PdfiumBackend`] binds the pdfium C++ library, which is blocking and
//! needs a native shared library. Hiding it behind [`PdfBackend`] keeps the
//! splitter testable with an in-memory backend.

use crate::error::SplitError;
use once_cell::sync::OnceCell;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info, warn};

// pdfium's init/destroy pair is process-global: dropping any `Pdfium` calls
// FPDF_DestroyLibrary under every other open document. Bind once and never drop.
static PDFIUM: OnceCell<BoundPdfium> = OnceCell::new();

struct BoundPdfium {
    pdfium: Pdfium,
    library: Option<PathBuf>,
}

/// One page of the source batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePage {
    /// Zero-based page index.
    pub index: usize,
    /// Extracted plain text; `None` when the page carries none.
    pub text: Option<String>,
    /// A serialised PDF containing exactly this page.
    pub document: Vec<u8>,
}

/// Receives the pages of a batch in order.
pub trait PageSink {
    /// Called once, before the first page, with the document's page count.
    fn begin(&mut self, total_pages: usize) -> Result<(), SplitError>;

    /// Called for each page in order. An error stops the pass.
    fn page(&mut self, page: SourcePage) -> Result<(), SplitError>;
}

/// PDF parsing and single-page serialisation.
pub trait PdfBackend: Send + Sync {
    /// Open `bytes` and feed every page to `sink`, returning the page count.
    fn split_pages(
        &self,
        bytes: Vec<u8>,
        password: Option<&str>,
        sink: &mut dyn PageSink,
    ) -> Result<usize, SplitError>;
}

/// [`PdfBackend`] backed by pdfium.
///
/// The library is bound on first use and shared by every backend in the
/// process; `thread_safe` pdfium-render serialises concurrent callers. Only
/// the first backend to bind chooses the library path.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    library: Option<PathBuf>,
}

impl PdfiumBackend {
    /// Use the library resolved by `pdfium-auto` (`PDFIUM_LIB_PATH`, the
    /// local cache, or a first-run download).
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a pdfium shared library at an explicit path.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library: Some(path.into()),
        }
    }

    fn bind(&self) -> Result<&'static Pdfium, SplitError> {
        let bound = PDFIUM.get_or_try_init(|| {
            let pdfium = match &self.library {
                Some(path) => pdfium_auto::bind_pdfium_from_path(path),
                None => pdfium_auto::bind_pdfium_silent(),
            }
            .map_err(|e| SplitError::PdfiumBindingFailed(e.to_string()))?;
            info!("pdfium bound ({})", describe_library(self.library.as_ref()));
            Ok::<_, SplitError>(BoundPdfium {
                pdfium,
                library: self.library.clone(),
            })
        })?;

        if self.library.is_some() && bound.library != self.library {
            warn!(
                "pdfium already bound to {}; ignoring {}",
                describe_library(bound.library.as_ref()),
                describe_library(self.library.as_ref())
            );
        }
        Ok(&bound.pdfium)
    }
}

fn describe_library(library: Option<&PathBuf>) -> String {
    library.map_or_else(|| "auto".to_string(), |p| p.display().to_string())
}

fn page_fault(index: usize, what: &str, e: PdfiumError) -> SplitError {
    SplitError::Extraction {
        page: Some(index + 1),
        detail: format!("{what}: {e:?}"),
    }
}

impl PdfBackend for PdfiumBackend {
    fn split_pages(
        &self,
        bytes: Vec<u8>,
        password: Option<&str>,
        sink: &mut dyn PageSink,
    ) -> Result<usize, SplitError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_vec(bytes, password)
            .map_err(|e| SplitError::Extraction {
                page: None,
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);
        sink.begin(total_pages)?;

        for index in 0..total_pages {
            let page_index = index as PdfPageIndex;

            let text = {
                let page = pages
                    .get(page_index)
                    .map_err(|e| page_fault(index, "page lookup", e))?;
                let text = page
                    .text()
                    .map_err(|e| page_fault(index, "text extraction", e))?
                    .all();
                (!text.trim().is_empty()).then_some(text)
            };

            let mut single = pdfium
                .create_new_pdf()
                .map_err(|e| page_fault(index, "create document", e))?;
            single
                .pages_mut()
                .copy_page_from_document(&document, page_index, 0)
                .map_err(|e| page_fault(index, "copy page", e))?;
            let serialised = single
                .save_to_bytes()
                .map_err(|e| page_fault(index, "serialise page", e))?;

            debug!(
                "Extracted page {} → {} chars, {} bytes",
                index + 1,
                text.as_ref().map_or(0, |t| t.chars().count()),
                serialised.len()
            );

            sink.page(SourcePage {
                index,
                text,
                document: serialised,
            })?;
        }

        Ok(total_pages)
    }
}
