//! Job splitting: one source batch in, one single-page PDF per page out.
//!
//! A job is nothing more than its id. Everything else is derived on each
//! call: the source is `<inbox>/<job_id>.pdf`, the year comes from the id,
//! and the output lands in the shared `<output>/<year>/` directory next to
//! every other job for that year.
//!
//! ## Failure contract
//!
//! [`JobSplitter::process`] never returns `Err`. A fault stops the job and
//! is reported in its [`JobResult`] together with the files written before
//! it; those files stay on disk. Re-running a job is safe because each page
//! overwrites `<identifier>.pdf` rather than adding a new file.

use crate::config::SplitConfig;
use crate::error::SplitError;
use crate::inbox::Inbox;
use crate::output::{JobResult, JobState};
use crate::pipeline::identifier::{
    classify_page, IdentifierStrategy, PayeeMarkerStrategy, UNKNOWN_IDENTIFIER,
};
use crate::pipeline::input;
use crate::pipeline::source::{PageSink, PdfBackend, PdfiumBackend, SourcePage};
use crate::pipeline::year::extract_year_from_job_id;
use crate::progress::ProgressCallback;
use crate::store::{FsOutputStore, OutputStore};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Splits certificate batches into per-taxpayer documents.
///
/// Cheap to share: wrap it in an [`Arc`] to run jobs from several tasks.
pub struct JobSplitter {
    config: SplitConfig,
    backend: Arc<dyn PdfBackend>,
    store: Arc<dyn OutputStore>,
    strategy: Arc<dyn IdentifierStrategy>,
}

impl JobSplitter {
    /// A splitter using pdfium, the filesystem store rooted at
    /// `config.output_dir`, and the payee-marker strategy.
    pub fn new(config: SplitConfig) -> Self {
        let store = FsOutputStore::new(&config.output_dir);
        let strategy = PayeeMarkerStrategy::new(config.payee_marker.clone());
        Self {
            config,
            backend: Arc::new(PdfiumBackend::new()),
            store: Arc::new(store),
            strategy: Arc::new(strategy),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn PdfBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn OutputStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn IdentifierStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn OutputStore {
        self.store.as_ref()
    }

    pub fn inbox(&self) -> Inbox {
        Inbox::new(&self.config.inbox_dir)
    }

    /// Split the batch for `job_id`.
    ///
    /// Blocking: runs a full pdfium pass. Use [`Self::process_async`] from
    /// async code.
    pub fn process(&self, job_id: &str) -> JobResult {
        let start = Instant::now();
        info!("Starting job: {}", job_id);

        // Existence is confirmed before the year directory is created.
        let source = match input::resolve_source(&self.config.inbox_dir, job_id) {
            Ok(path) => path,
            Err(e) => {
                error!("{}", e);
                return self.finish(JobResult::failure(job_id, None, Vec::new(), &e));
            }
        };

        let year = extract_year_from_job_id(job_id);
        let mut writer = PageWriter {
            job_id,
            year: &year,
            store: self.store.as_ref(),
            strategy: self.strategy.as_ref(),
            progress: self.config.progress_callback.as_ref(),
            total_pages: None,
            created_files: Vec::new(),
        };

        let result = match self.run(&source, &year, &mut writer) {
            Ok(total_pages) => {
                if total_pages != writer.created_files.len() {
                    warn!(
                        "Job {}: document reports {} pages but {} were extracted",
                        job_id,
                        total_pages,
                        writer.created_files.len()
                    );
                }
                info!(
                    "Job {} done: {} pages → {} in {}ms",
                    job_id,
                    total_pages,
                    year,
                    start.elapsed().as_millis()
                );
                JobResult::success(job_id, total_pages, writer.created_files)
            }
            Err(e) => {
                error!(
                    "Error processing job {} after {} files: {}",
                    job_id,
                    writer.created_files.len(),
                    e
                );
                JobResult::failure(job_id, writer.total_pages, writer.created_files, &e)
            }
        };
        self.finish(result)
    }

    fn run(&self, source: &Path, year: &str, writer: &mut PageWriter<'_>) -> Result<usize, SplitError> {
        self.store.ensure_year(year)?;
        info!("Scanning {}", source.display());
        let bytes = input::read_source(source)?;
        self.backend
            .split_pages(bytes, self.config.password.as_deref(), writer)
    }

    fn finish(&self, result: JobResult) -> JobResult {
        if let Some(cb) = &self.config.progress_callback {
            cb.on_job_complete(&result);
        }
        result
    }

    /// [`Self::process`] on the blocking thread pool.
    pub async fn process_async(self: Arc<Self>, job_id: String) -> JobResult {
        let id = job_id.clone();
        tokio::task::spawn_blocking(move || self.process(&job_id))
            .await
            .unwrap_or_else(|e| {
                let err = SplitError::Internal(format!("Job task panicked: {}", e));
                error!("{}", err);
                JobResult::failure(id, None, Vec::new(), &err)
            })
    }

    /// Process several jobs, at most `config.concurrency` at a time.
    ///
    /// Results come back in the order of `job_ids`. Jobs for the same year
    /// may run together; each write replaces its target atomically, so the
    /// last writer of a shared filename wins.
    pub async fn process_many(self: &Arc<Self>, job_ids: Vec<String>) -> Vec<JobResult> {
        let concurrency = self.config.concurrency.max(1);
        info!("Processing {} jobs ({} at a time)", job_ids.len(), concurrency);
        stream::iter(job_ids)
            .map(|id| Arc::clone(self).process_async(id))
            .buffered(concurrency)
            .collect()
            .await
    }

    /// Current state of `job_id`, read from the shared tree.
    ///
    /// The year directory decides `Completed` before the inbox is consulted:
    /// sources stay in the inbox after processing, and output carries no
    /// record of which job wrote it. See [`JobState::Completed`].
    pub fn status(&self, job_id: &str) -> Result<JobState, SplitError> {
        input::ensure_component(job_id)?;
        let year = extract_year_from_job_id(job_id);

        if self.store.has_year(&year)? {
            let files = self.store.list_files(&year)?;
            return Ok(JobState::Completed {
                job_id: job_id.to_string(),
                year,
                file_count: files.len(),
                files,
            });
        }
        if self.inbox().contains(job_id)? {
            return Ok(JobState::Pending {
                job_id: job_id.to_string(),
            });
        }
        Ok(JobState::NotFound {
            job_id: job_id.to_string(),
        })
    }
}

/// Classifies and writes each page as the source pass yields it.
struct PageWriter<'a> {
    job_id: &'a str,
    year: &'a str,
    store: &'a dyn OutputStore,
    strategy: &'a dyn IdentifierStrategy,
    progress: Option<&'a ProgressCallback>,
    total_pages: Option<usize>,
    created_files: Vec<String>,
}

impl PageSink for PageWriter<'_> {
    fn begin(&mut self, total_pages: usize) -> Result<(), SplitError> {
        info!("Splitting {} pages for {}", total_pages, self.job_id);
        self.total_pages = Some(total_pages);
        if let Some(cb) = self.progress {
            cb.on_job_start(self.job_id, total_pages);
        }
        Ok(())
    }

    fn page(&mut self, page: SourcePage) -> Result<(), SplitError> {
        let identifier = classify_page(self.strategy, page.text.as_deref());
        if identifier == UNKNOWN_IDENTIFIER {
            warn!("Job {}: no identifier on page {}", self.job_id, page.index + 1);
        }

        let filename = format!("{identifier}.pdf");
        self.store
            .write_document(self.year, &filename, &page.document)?;
        debug!(
            "Job {}: page {} → {}/{}",
            self.job_id,
            page.index + 1,
            self.year,
            filename
        );

        if let Some(cb) = self.progress {
            let total = self.total_pages.unwrap_or(0);
            cb.on_page_written(self.job_id, page.index + 1, total, &filename);
        }
        self.created_files.push(filename);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::JobOutcome;

    /// Emits one page per entry; the document bytes echo the text.
    struct EchoBackend(Vec<Option<&'static str>>);

    impl PdfBackend for EchoBackend {
        fn split_pages(
            &self,
            _bytes: Vec<u8>,
            _password: Option<&str>,
            sink: &mut dyn PageSink,
        ) -> Result<usize, SplitError> {
            sink.begin(self.0.len())?;
            for (index, text) in self.0.iter().enumerate() {
                sink.page(SourcePage {
                    index,
                    text: text.map(str::to_string),
                    document: format!("%PDF page {index}").into_bytes(),
                })?;
            }
            Ok(self.0.len())
        }
    }

    fn splitter(tmp: &Path, pages: Vec<Option<&'static str>>) -> JobSplitter {
        let config = SplitConfig::builder().shared_dir(tmp).build().unwrap();
        config.ensure_directories().unwrap();
        JobSplitter::new(config).with_backend(Arc::new(EchoBackend(pages)))
    }

    #[test]
    fn status_moves_from_not_found_to_pending_to_completed() {
        let tmp = tempfile::tempdir().unwrap();
        let s = splitter(tmp.path(), vec![Some("id 3101700123456")]);

        assert!(matches!(s.status("tax-2568-1").unwrap(), JobState::NotFound { .. }));

        std::fs::write(s.config().source_path("tax-2568-1"), b"%PDF-1.7").unwrap();
        assert!(matches!(s.status("tax-2568-1").unwrap(), JobState::Pending { .. }));

        let r = s.process("tax-2568-1");
        assert_eq!(r.status, JobOutcome::Success);
        match s.status("tax-2568-1").unwrap() {
            JobState::Completed {
                year,
                file_count,
                files,
                ..
            } => {
                assert_eq!(year, "2568");
                assert_eq!(file_count, 1);
                assert_eq!(files, vec!["3101700123456.pdf"]);
            }
            other => panic!("expected completed, got {other:?}"),
        }
    }

    #[test]
    fn pages_without_text_are_unknown() {
        let tmp = tempfile::tempdir().unwrap();
        let s = splitter(tmp.path(), vec![None, Some("   ")]);
        std::fs::write(s.config().source_path("job-2568"), b"%PDF-1.7").unwrap();

        let r = s.process("job-2568");
        assert_eq!(r.created_files, vec!["unknown.pdf", "unknown.pdf"]);
        assert_eq!(r.page_count, Some(2));
    }

    #[test]
    fn not_a_pdf_is_extraction_fault() {
        let tmp = tempfile::tempdir().unwrap();
        let s = splitter(tmp.path(), vec![Some("x")]);
        std::fs::write(s.config().source_path("tax-2568-1"), b"GIF89a").unwrap();

        let r = s.process("tax-2568-1");
        assert_eq!(r.status, JobOutcome::Failed);
        assert_eq!(r.error_kind, Some(crate::error::FaultKind::ExtractionFault));
        assert!(r.created_files.is_empty());
    }
}
