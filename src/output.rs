//! Result types returned by the splitter and the output store.
//!
//! Every type serialises to camelCase JSON so the CLI's `--json` output (and
//! any host service) reports `jobId`, `pageCount`, `createdFiles`, etc.

use crate::error::{FaultKind, SplitError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Final status of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobOutcome {
    Success,
    Failed,
}

/// Outcome of processing one job.
///
/// On failure `created_files` holds the files written before the fault; they
/// are left on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub job_id: String,
    pub status: JobOutcome,
    /// Total pages in the source; `None` if the source was never opened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    /// Filenames written, in page order, one entry per write.
    pub created_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FaultKind>,
}

impl JobResult {
    pub fn success(job_id: impl Into<String>, page_count: usize, created_files: Vec<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobOutcome::Success,
            page_count: Some(page_count),
            created_files,
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(
        job_id: impl Into<String>,
        page_count: Option<usize>,
        created_files: Vec<String>,
        error: &SplitError,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobOutcome::Failed,
            page_count,
            created_files,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobOutcome::Success
    }

    /// True when the job failed because its source does not exist.
    pub fn is_not_found(&self) -> bool {
        self.error_kind == Some(FaultKind::NotFound)
    }
}

/// State of a job as derived from the shared filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum JobState {
    /// The job's year directory exists; `files` lists every PDF in it.
    ///
    /// Output is grouped by year, not by job, so this is a year-level state:
    /// once any job of the same year has run, every job of that year reports
    /// `Completed` and `files` includes pages written by the other jobs.
    #[serde(rename_all = "camelCase")]
    Completed {
        job_id: String,
        year: String,
        file_count: usize,
        files: Vec<String>,
    },
    /// The source is in the inbox but nothing has been written for its year.
    #[serde(rename_all = "camelCase")]
    Pending { job_id: String },
    /// Neither a source nor an output directory exists.
    #[serde(rename_all = "camelCase")]
    NotFound { job_id: String },
}

/// A stored single-page output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub year: String,
    pub identifier: String,
    pub filename: String,
    pub location: PathBuf,
}
