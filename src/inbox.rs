//! Inbox housekeeping: the source batches waiting to be split.

use crate::error::SplitError;
use crate::pipeline::input::ensure_component;
use crate::store::list_pdfs;
use std::path::{Path, PathBuf};
use tracing::info;

/// The directory where `<job_id>.pdf` batches are dropped.
#[derive(Debug, Clone)]
pub struct Inbox {
    dir: PathBuf,
}

impl Inbox {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// PDF files directly in the inbox, sorted. Empty if the inbox is absent.
    pub fn list(&self) -> Result<Vec<String>, SplitError> {
        list_pdfs(&self.dir)
    }

    /// Whether a source batch exists for `job_id`.
    pub fn contains(&self, job_id: &str) -> Result<bool, SplitError> {
        ensure_component(job_id)?;
        Ok(self.dir.join(format!("{job_id}.pdf")).is_file())
    }

    /// Delete one inbox file by name. Returns `false` if there was no such file.
    pub fn delete(&self, filename: &str) -> Result<bool, SplitError> {
        ensure_component(filename)?;
        let path = self.dir.join(filename);
        if !path.is_file() {
            return Ok(false);
        }
        std::fs::remove_file(&path).map_err(|e| SplitError::io(&path, e))?;
        info!("Deleted inbox file {}", path.display());
        Ok(true)
    }
}
