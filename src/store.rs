//! Output store: the per-year directories under the shared output root.
//!
//! Year directories are shared by every job resolving to the same year, so
//! job processing only ever creates them and overwrites single files inside
//! them. Deleting a year is an explicit maintenance call
//! ([`OutputStore::clear_year`]) and never touches siblings or the root.
//!
//! The splitter talks to the [`OutputStore`] trait, not the filesystem, so
//! the directory tree can be swapped for another backing store without
//! changing the job contract.

use crate::error::SplitError;
use crate::output::StoredDocument;
use crate::pipeline::input::ensure_component;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Storage for single-page output documents keyed by (year, filename).
pub trait OutputStore: Send + Sync {
    /// Create the year container if missing. Safe under concurrent callers.
    fn ensure_year(&self, year: &str) -> Result<(), SplitError>;

    /// Write `bytes` as `filename` in `year`, replacing any existing file.
    ///
    /// Readers observe either the old or the new document, never a
    /// partial one.
    fn write_document(&self, year: &str, filename: &str, bytes: &[u8]) -> Result<(), SplitError>;

    /// Delete a year and everything in it. Returns whether it existed.
    fn clear_year(&self, year: &str) -> Result<bool, SplitError>;

    /// Names of the existing years, sorted.
    fn list_years(&self) -> Result<Vec<String>, SplitError>;

    /// PDF filenames directly inside `year`, sorted; empty if the year is absent.
    fn list_files(&self, year: &str) -> Result<Vec<String>, SplitError>;

    /// Whether the year container exists.
    fn has_year(&self, year: &str) -> Result<bool, SplitError>;

    /// Look up the document stored for `identifier` in `year`.
    fn locate(&self, year: &str, identifier: &str) -> Result<Option<StoredDocument>, SplitError>;
}

/// [`OutputStore`] over `<root>/<year>/<filename>`.
#[derive(Debug, Clone)]
pub struct FsOutputStore {
    root: PathBuf,
}

impl FsOutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a year directory, after validating the name.
    pub fn year_dir(&self, year: &str) -> Result<PathBuf, SplitError> {
        ensure_component(year)?;
        Ok(self.root.join(year))
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "pdf")
}

/// Names of entries in `dir` accepted by `keep`, sorted. A missing `dir`
/// yields an empty list.
pub(crate) fn list_dir(
    dir: &Path,
    keep: impl Fn(&std::fs::FileType, &Path) -> bool,
) -> Result<Vec<String>, SplitError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SplitError::io(dir, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SplitError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| SplitError::io(entry.path(), e))?;
        if keep(&file_type, &entry.path()) {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

pub(crate) fn list_pdfs(dir: &Path) -> Result<Vec<String>, SplitError> {
    list_dir(dir, |ft, path| ft.is_file() && is_pdf(path))
}

impl OutputStore for FsOutputStore {
    fn ensure_year(&self, year: &str) -> Result<(), SplitError> {
        let dir = self.year_dir(year)?;
        // create_dir_all tolerates a concurrent creator.
        std::fs::create_dir_all(&dir).map_err(|e| SplitError::io(&dir, e))?;
        debug!("Year directory ready: {}", dir.display());
        Ok(())
    }

    fn write_document(&self, year: &str, filename: &str, bytes: &[u8]) -> Result<(), SplitError> {
        ensure_component(filename)?;
        let dir = self.year_dir(year)?;
        let target = dir.join(filename);
        let write_err = |source| SplitError::Write {
            path: target.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&target).map_err(|e| write_err(e.error))?;

        debug!("Wrote {} ({} bytes)", target.display(), bytes.len());
        Ok(())
    }

    fn clear_year(&self, year: &str) -> Result<bool, SplitError> {
        let dir = self.year_dir(year)?;
        if !dir.is_dir() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&dir).map_err(|e| SplitError::io(&dir, e))?;
        info!("Cleared output year {}", dir.display());
        Ok(true)
    }

    fn list_years(&self) -> Result<Vec<String>, SplitError> {
        list_dir(&self.root, |ft, _| ft.is_dir())
    }

    fn list_files(&self, year: &str) -> Result<Vec<String>, SplitError> {
        list_pdfs(&self.year_dir(year)?)
    }

    fn has_year(&self, year: &str) -> Result<bool, SplitError> {
        Ok(self.year_dir(year)?.is_dir())
    }

    fn locate(&self, year: &str, identifier: &str) -> Result<Option<StoredDocument>, SplitError> {
        ensure_component(identifier)?;
        let filename = format!("{identifier}.pdf");
        let location = self.year_dir(year)?.join(&filename);
        if !location.is_file() {
            return Ok(None);
        }
        Ok(Some(StoredDocument {
            year: year.to_string(),
            identifier: identifier.to_string(),
            filename,
            location,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsOutputStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsOutputStore::new(tmp.path().join("output"));
        (tmp, store)
    }

    #[test]
    fn ensure_creates_missing_ancestors_and_is_idempotent() {
        let (_tmp, store) = store();
        store.ensure_year("2568").unwrap();
        store.ensure_year("2568").unwrap();
        assert!(store.root().join("2568").is_dir());
    }

    #[test]
    fn write_overwrites_existing_file() {
        let (_tmp, store) = store();
        store.ensure_year("2568").unwrap();
        store.write_document("2568", "1111111111111.pdf", b"first").unwrap();
        store.write_document("2568", "1111111111111.pdf", b"second").unwrap();
        let on_disk = std::fs::read(store.root().join("2568/1111111111111.pdf")).unwrap();
        assert_eq!(on_disk, b"second");
        assert_eq!(store.list_files("2568").unwrap(), vec!["1111111111111.pdf"]);
    }

    #[test]
    fn write_into_missing_year_is_write_fault() {
        let (_tmp, store) = store();
        let err = store.write_document("2568", "x.pdf", b"x").unwrap_err();
        assert!(matches!(err, SplitError::Write { .. }));
    }

    #[test]
    fn list_files_only_pdfs_directly_inside() {
        let (_tmp, store) = store();
        store.ensure_year("2568").unwrap();
        let dir = store.root().join("2568");
        std::fs::write(dir.join("b.pdf"), b"b").unwrap();
        std::fs::write(dir.join("a.pdf"), b"a").unwrap();
        std::fs::write(dir.join("notes.txt"), b"n").unwrap();
        std::fs::create_dir(dir.join("nested.pdf")).unwrap();
        assert_eq!(store.list_files("2568").unwrap(), vec!["a.pdf", "b.pdf"]);
        assert!(store.list_files("2999").unwrap().is_empty());
    }

    #[test]
    fn list_years_ignores_files_and_missing_root() {
        let (_tmp, store) = store();
        assert!(store.list_years().unwrap().is_empty());
        store.ensure_year("2568").unwrap();
        store.ensure_year("2567").unwrap();
        std::fs::write(store.root().join("stray.pdf"), b"x").unwrap();
        assert_eq!(store.list_years().unwrap(), vec!["2567", "2568"]);
    }

    #[test]
    fn clear_year_leaves_siblings_and_root() {
        let (_tmp, store) = store();
        assert!(!store.clear_year("2568").unwrap());

        store.ensure_year("2567").unwrap();
        store.ensure_year("2568").unwrap();
        store.write_document("2567", "a.pdf", b"a").unwrap();
        store.write_document("2568", "b.pdf", b"b").unwrap();

        assert!(store.clear_year("2568").unwrap());
        assert!(!store.has_year("2568").unwrap());
        assert!(store.root().is_dir());
        assert_eq!(store.list_files("2567").unwrap(), vec!["a.pdf"]);
    }

    #[test]
    fn names_outside_the_root_are_rejected() {
        let (_tmp, store) = store();
        assert!(matches!(
            store.clear_year("..").unwrap_err(),
            SplitError::InvalidName { .. }
        ));
        assert!(store.locate("2568", "../x").is_err());
        assert!(store.write_document("2568", "a/b.pdf", b"x").is_err());
    }

    #[test]
    fn locate_finds_stored_document() {
        let (_tmp, store) = store();
        store.ensure_year("2568").unwrap();
        store.write_document("2568", "3101700123456.pdf", b"%PDF").unwrap();

        let doc = store.locate("2568", "3101700123456").unwrap().unwrap();
        assert_eq!(doc.filename, "3101700123456.pdf");
        assert_eq!(doc.location, store.root().join("2568/3101700123456.pdf"));
        assert!(store.locate("2568", "0000000000000").unwrap().is_none());
    }
}
