//! Progress-callback trait for per-page split events.
//!
//! Inject an [`Arc<dyn JobProgressCallback>`] via
//! [`crate::config::SplitConfigBuilder::progress_callback`] to receive events
//! as the splitter writes each page. Jobs in a batch run concurrently, so
//! every event carries the job id it belongs to.
//!
//! # Example
//!
//! ```rust
//! use pdf_split_worker::{JobProgressCallback, SplitConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl JobProgressCallback for CountingCallback {
//!     fn on_page_written(&self, job_id: &str, page_num: usize, total: usize, filename: &str) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("[{job_id}] page {page_num}/{total} → {filename}");
//!     }
//! }
//!
//! let config = SplitConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { written: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::JobResult;
use std::sync::Arc;

/// Called by the splitter as it processes a job.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`; events from
/// different jobs may arrive concurrently from different threads.
pub trait JobProgressCallback: Send + Sync {
    /// Called once the source has been opened and its page count is known.
    fn on_job_start(&self, _job_id: &str, _total_pages: usize) {}

    /// Called after a page's output document has been written.
    ///
    /// `page_num` is 1-indexed.
    fn on_page_written(&self, _job_id: &str, _page_num: usize, _total: usize, _filename: &str) {}

    /// Called once per job with its final result, success or failure.
    fn on_job_complete(&self, _result: &JobResult) {}
}

/// Shared handle to a progress callback.
pub type ProgressCallback = Arc<dyn JobProgressCallback>;

/// A callback that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressCallback;

impl JobProgressCallback for NoopProgressCallback {}
