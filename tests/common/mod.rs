//! Shared fixtures: a scripted PDF backend and a temporary shared tree.

#![allow(dead_code)]

use pdf_split_worker::{
    FsOutputStore, JobSplitter, OutputStore, PageSink, PdfBackend, SourcePage, SplitConfig,
    SplitError, StoredDocument,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// What the scripted backend yields for one page.
#[derive(Debug, Clone)]
pub enum Page {
    Text(String),
    Blank,
    Fault,
}

pub fn text(s: impl Into<String>) -> Page {
    Page::Text(s.into())
}

/// A backend that replays a fixed page script instead of parsing the PDF.
///
/// The single-page document for page N is `"%PDF-1.7 page N of T"`.
pub struct ScriptedBackend {
    pages: Vec<Page>,
}

impl ScriptedBackend {
    pub fn new(pages: Vec<Page>) -> Arc<Self> {
        Arc::new(Self { pages })
    }
}

pub fn page_document(page_num: usize, total: usize) -> Vec<u8> {
    format!("%PDF-1.7 page {page_num} of {total}").into_bytes()
}

impl PdfBackend for ScriptedBackend {
    fn split_pages(
        &self,
        bytes: Vec<u8>,
        _password: Option<&str>,
        sink: &mut dyn PageSink,
    ) -> Result<usize, SplitError> {
        assert!(bytes.starts_with(b"%PDF"), "splitter must pass the source bytes");
        let total = self.pages.len();
        sink.begin(total)?;
        for (index, page) in self.pages.iter().enumerate() {
            let text = match page {
                Page::Text(t) => Some(t.clone()),
                Page::Blank => None,
                Page::Fault => {
                    return Err(SplitError::Extraction {
                        page: Some(index + 1),
                        detail: "corrupt content stream".into(),
                    })
                }
            };
            sink.page(SourcePage {
                index,
                text,
                document: page_document(index + 1, total),
            })?;
        }
        Ok(total)
    }
}

/// Delegates to a filesystem store but fails the `fail_on`-th write (1-based).
pub struct FailingStore {
    inner: FsOutputStore,
    writes: AtomicUsize,
    fail_on: usize,
}

impl FailingStore {
    pub fn new(root: &Path, fail_on: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: FsOutputStore::new(root),
            writes: AtomicUsize::new(0),
            fail_on,
        })
    }
}

impl OutputStore for FailingStore {
    fn ensure_year(&self, year: &str) -> Result<(), SplitError> {
        self.inner.ensure_year(year)
    }

    fn write_document(&self, year: &str, filename: &str, bytes: &[u8]) -> Result<(), SplitError> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(SplitError::Write {
                path: self.inner.root().join(year).join(filename),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.write_document(year, filename, bytes)
    }

    fn clear_year(&self, year: &str) -> Result<bool, SplitError> {
        self.inner.clear_year(year)
    }

    fn list_years(&self) -> Result<Vec<String>, SplitError> {
        self.inner.list_years()
    }

    fn list_files(&self, year: &str) -> Result<Vec<String>, SplitError> {
        self.inner.list_files(year)
    }

    fn has_year(&self, year: &str) -> Result<bool, SplitError> {
        self.inner.has_year(year)
    }

    fn locate(&self, year: &str, identifier: &str) -> Result<Option<StoredDocument>, SplitError> {
        self.inner.locate(year, identifier)
    }
}

/// A temporary shared tree with inbox/processing/output/logs.
pub struct SharedTree {
    pub dir: TempDir,
    pub config: SplitConfig,
}

impl SharedTree {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = SplitConfig::builder()
            .shared_dir(dir.path())
            .build()
            .expect("config");
        config.ensure_directories().expect("bootstrap");
        Self { dir, config }
    }

    /// Drop a source batch into the inbox. Content only needs the PDF magic.
    pub fn add_source(&self, job_id: &str) {
        std::fs::write(self.config.source_path(job_id), b"%PDF-1.7\n%scripted\n").expect("write source");
    }

    pub fn splitter(&self, pages: Vec<Page>) -> JobSplitter {
        JobSplitter::new(self.config.clone()).with_backend(ScriptedBackend::new(pages))
    }

    pub fn output_file(&self, year: &str, filename: &str) -> std::path::PathBuf {
        self.config.output_dir.join(year).join(filename)
    }
}
