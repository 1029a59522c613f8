//! Configuration for the split worker.
//!
//! All behaviour is controlled through [`SplitConfig`], built via its
//! [`SplitConfigBuilder`]. The worker operates on one shared directory tree:
//!
//! ```text
//! <shared_dir>/
//!   inbox/        source batches, one `<job_id>.pdf` per job
//!   processing/   reserved for the host service
//!   output/<year>/<identifier>.pdf
//!   logs/
//! ```

use crate::error::SplitError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default shared root when `SHARED_DIR` is not set.
pub const DEFAULT_SHARED_DIR: &str = "/shared";

/// The marker phrase printed before the payee ("withholdee") block of a
/// 50 Tawi certificate.
pub const DEFAULT_PAYEE_MARKER: &str = "ผู้ถูกหักภาษี";

/// Configuration for splitting jobs.
///
/// # Example
/// ```rust
/// use pdf_split_worker::SplitConfig;
///
/// let config = SplitConfig::builder()
///     .shared_dir("/tmp/shared")
///     .concurrency(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.inbox_dir, std::path::PathBuf::from("/tmp/shared/inbox"));
/// ```
#[derive(Clone)]
pub struct SplitConfig {
    /// Root of the shared tree. Default: `/shared`.
    pub shared_dir: PathBuf,

    /// Where source batches are dropped. Default: `<shared_dir>/inbox`.
    pub inbox_dir: PathBuf,

    /// Root of the per-year output directories. Default: `<shared_dir>/output`.
    pub output_dir: PathBuf,

    /// Default: `<shared_dir>/processing`.
    pub processing_dir: PathBuf,

    /// Default: `<shared_dir>/logs`.
    pub logs_dir: PathBuf,

    /// Phrase after which the payee's identifier is printed.
    pub payee_marker: String,

    /// PDF user password for encrypted batches.
    pub password: Option<String>,

    /// Jobs run at once by [`crate::JobSplitter::process_many`]. Default: 4.
    pub concurrency: usize,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self::with_shared_dir(DEFAULT_SHARED_DIR)
    }
}

impl fmt::Debug for SplitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitConfig")
            .field("shared_dir", &self.shared_dir)
            .field("inbox_dir", &self.inbox_dir)
            .field("output_dir", &self.output_dir)
            .field("processing_dir", &self.processing_dir)
            .field("logs_dir", &self.logs_dir)
            .field("payee_marker", &self.payee_marker)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn JobProgressCallback>"),
            )
            .finish()
    }
}

impl SplitConfig {
    /// Create a new builder for `SplitConfig`.
    pub fn builder() -> SplitConfigBuilder {
        SplitConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default layout rooted at `SHARED_DIR` (or `/shared`).
    pub fn from_env() -> Self {
        match std::env::var("SHARED_DIR") {
            Ok(dir) if !dir.is_empty() => Self::with_shared_dir(dir),
            _ => Self::default(),
        }
    }

    fn with_shared_dir(shared: impl Into<PathBuf>) -> Self {
        let shared = shared.into();
        Self {
            inbox_dir: shared.join("inbox"),
            output_dir: shared.join("output"),
            processing_dir: shared.join("processing"),
            logs_dir: shared.join("logs"),
            shared_dir: shared,
            payee_marker: DEFAULT_PAYEE_MARKER.to_string(),
            password: None,
            concurrency: 4,
            progress_callback: None,
        }
    }

    /// Source location for a job: `<inbox>/<job_id>.pdf`.
    pub fn source_path(&self, job_id: &str) -> PathBuf {
        self.inbox_dir.join(format!("{job_id}.pdf"))
    }

    /// Create every shared directory that is missing.
    ///
    /// Returns the directories checked, in creation order.
    pub fn ensure_directories(&self) -> Result<Vec<PathBuf>, SplitError> {
        let dirs = [
            &self.inbox_dir,
            &self.processing_dir,
            &self.output_dir,
            &self.logs_dir,
        ];
        let mut checked = Vec::with_capacity(dirs.len());
        for dir in dirs {
            std::fs::create_dir_all(dir).map_err(|e| SplitError::io(dir, e))?;
            info!("Checked/Created: {}", dir.display());
            checked.push(dir.clone());
        }
        Ok(checked)
    }
}

/// Builder for [`SplitConfig`].
#[derive(Debug)]
pub struct SplitConfigBuilder {
    config: SplitConfig,
}

impl SplitConfigBuilder {
    /// Set the shared root and re-derive the four sub-directories from it.
    ///
    /// Call the individual directory setters afterwards to override one.
    pub fn shared_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let fresh = SplitConfig::with_shared_dir(dir.as_ref());
        self.config.shared_dir = fresh.shared_dir;
        self.config.inbox_dir = fresh.inbox_dir;
        self.config.output_dir = fresh.output_dir;
        self.config.processing_dir = fresh.processing_dir;
        self.config.logs_dir = fresh.logs_dir;
        self
    }

    pub fn inbox_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.inbox_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn processing_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.processing_dir = dir.into();
        self
    }

    pub fn logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.logs_dir = dir.into();
        self
    }

    pub fn payee_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.payee_marker = marker.into();
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SplitConfig, SplitError> {
        let c = &self.config;
        if c.payee_marker.is_empty() {
            return Err(SplitError::InvalidConfig(
                "Payee marker must not be empty".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(SplitError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
