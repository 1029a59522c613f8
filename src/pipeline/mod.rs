//! Pipeline stages for splitting a certificate batch.
//!
//! Each submodule implements exactly one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ source ──▶ identifier ──▶ store
//! (inbox)   (pdfium)   (payee id)     (<year>/<id>.pdf)
//!   │
//!   └──▶ year (from the job id)
//! ```
//!
//! 1. [`input`]      — resolve `<inbox>/<job_id>.pdf` and read it
//! 2. [`year`]       — derive the output year from the job id
//! 3. [`source`]     — one pass over the PDF yielding each page's text and a
//!    single-page document
//! 4. [`identifier`] — pick the payee's 13-digit id from the page text
//!
//! Writing is done by [`crate::store`]; orchestration by [`crate::splitter`].

pub mod identifier;
pub mod input;
pub mod source;
pub mod year;
