//! Durable marker recording that the pro edition was selected on this installation.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::MarkerError;

/// File name of the marker under the work directory.
pub const EDITION_PRO_MARKER: &str = "edition_pro";

/// Zero-byte marker file under the work directory.
///
/// Created at most once and never deleted here. Check-then-create is not
/// atomic; bootstrap runs in a single process.
#[derive(Debug, Clone)]
pub struct EditionMarkerStore {
    path: PathBuf,
}

impl EditionMarkerStore {
    pub fn new(work_dir: &Path) -> Self {
        Self {
            path: work_dir.join(EDITION_PRO_MARKER),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create the marker if it does not exist yet.
    ///
    /// Returns `true` when this call created the file.
    pub fn ensure(&self) -> Result<bool, MarkerError> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(_) => {
                debug!("Created pro edition marker file: {:?}", self.path);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(source) => Err(MarkerError {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_creates_once() {
        let tmp = tempdir().unwrap();
        let store = EditionMarkerStore::new(tmp.path());

        assert!(!store.exists());
        assert!(store.ensure().unwrap());
        assert!(store.exists());
        assert_eq!(std::fs::metadata(store.path()).unwrap().len(), 0);

        // Second call is a no-op
        assert!(!store.ensure().unwrap());
        assert!(store.exists());
    }

    #[test]
    fn test_ensure_fails_without_directory() {
        let tmp = tempdir().unwrap();
        let store = EditionMarkerStore::new(&tmp.path().join("missing"));

        let err = store.ensure().unwrap_err();
        assert!(err.path.ends_with(EDITION_PRO_MARKER));
        assert!(!store.exists());
    }
}
