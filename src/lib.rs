//! # pdf-split-worker
//!
//! Split a batch of Thai withholding-tax certificates (50 Tawi) into one
//! single-page PDF per taxpayer, grouped by fiscal year.
//!
//! A batch arrives as `<inbox>/<job_id>.pdf`. Each page is classified by
//! the payee's 13-digit taxpayer id found in its text and written to
//! `<output>/<year>/<id>.pdf`, where the year is the first 4-digit run in
//! the job id. Pages with no id are written to `unknown.pdf`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! <inbox>/<job_id>.pdf
//!  │
//!  ├─ 1. Input       resolve and read the source batch
//!  ├─ 2. Year        "tax-2568-1" → "2568"
//!  ├─ 3. Source      one pdfium pass: page text + single-page PDF
//!  ├─ 4. Identifier  payee id from the page text (or "unknown")
//!  └─ 5. Store       atomic write to <output>/<year>/<id>.pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_split_worker::{JobSplitter, SplitConfig};
//!
//! let config = SplitConfig::from_env();
//! config.ensure_directories()?;
//! let splitter = JobSplitter::new(config);
//! let result = splitter.process("tax-2568-1");
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-split` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod inbox;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod splitter;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SplitConfig, SplitConfigBuilder};
pub use error::{FaultKind, SplitError};
pub use inbox::Inbox;
pub use output::{JobOutcome, JobResult, JobState, StoredDocument};
pub use pipeline::identifier::{IdentifierStrategy, PayeeMarkerStrategy, UNKNOWN_IDENTIFIER};
pub use pipeline::source::{PageSink, PdfBackend, PdfiumBackend, SourcePage};
pub use pipeline::year::{extract_year_from_job_id, UNKNOWN_YEAR};
pub use progress::{JobProgressCallback, NoopProgressCallback, ProgressCallback};
pub use splitter::JobSplitter;
pub use store::{FsOutputStore, OutputStore};
