//! Input resolution: map a job id to its source batch in the inbox.
//!
//! Existence is checked before anything else touches the filesystem, so a
//! missing source never creates an output directory. Job ids, years and
//! filenames all end up as path components under the shared tree;
//! [`ensure_component`] rejects anything that could step outside it.

use crate::error::SplitError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reject names that are not exactly one normal path component.
pub fn ensure_component(name: &str) -> Result<(), SplitError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(SplitError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Resolve `<inbox>/<job_id>.pdf`, failing with
/// [`SplitError::SourceNotFound`] if it is not a file.
pub fn resolve_source(inbox_dir: &Path, job_id: &str) -> Result<PathBuf, SplitError> {
    ensure_component(job_id)?;
    let path = inbox_dir.join(format!("{job_id}.pdf"));
    if !path.is_file() {
        return Err(SplitError::SourceNotFound {
            job_id: job_id.to_string(),
            path,
        });
    }
    debug!("Resolved source PDF: {}", path.display());
    Ok(path)
}

/// Read a source batch, validating the PDF magic bytes.
pub fn read_source(path: &Path) -> Result<Vec<u8>, SplitError> {
    let mut file = std::fs::File::open(path).map_err(|e| SplitError::io(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| SplitError::io(path, e))?;

    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(SplitError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}
