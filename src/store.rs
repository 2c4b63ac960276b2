//! Artifact store - a flat directory of uploaded files
//!
//! The filesystem is the system of record: one file per artifact, named
//! `{uuid}.sqlite` or (transiently, while a conversion is in flight)
//! `{uuid}.csv`. No metadata database exists beside it.

use std::path::{Path, PathBuf};
use uuid::Uuid;
use crate::Result;

/// Artifact file formats accepted by the upload endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A ready-to-query SQLite database file
    Sqlite,
    /// A CSV file, converted to SQLite on upload and then deleted
    Csv,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Csv => "csv",
        }
    }

    /// Match an extension tag, case-insensitively
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("sqlite") {
            Some(Self::Sqlite)
        } else if ext.eq_ignore_ascii_case("csv") {
            Some(Self::Csv)
        } else {
            None
        }
    }

    /// Classify an uploaded filename by its final dot-suffix.
    /// A name without a dot has no extension and is rejected.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

/// Directory-backed store for uploaded artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open a store rooted at `root` (creates the directory if missing)
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path for an artifact: `{root}/{uuid}.{ext}`
    pub fn artifact_path(&self, id: Uuid, kind: ArtifactKind) -> PathBuf {
        self.root.join(format!("{}.{}", id, kind.as_str()))
    }

    /// Persist raw uploaded bytes and return the file path
    pub fn save(&self, id: Uuid, kind: ArtifactKind, data: &[u8]) -> Result<PathBuf> {
        let path = self.artifact_path(id, kind);
        std::fs::write(&path, data)?;
        Ok(path)
    }

    pub fn contains(&self, id: Uuid, kind: ArtifactKind) -> bool {
        self.artifact_path(id, kind).is_file()
    }

    pub fn remove(&self, id: Uuid, kind: ArtifactKind) -> Result<()> {
        std::fs::remove_file(self.artifact_path(id, kind))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_filename() {
        assert_eq!(ArtifactKind::from_filename("data.sqlite"), Some(ArtifactKind::Sqlite));
        assert_eq!(ArtifactKind::from_filename("data.CSV"), Some(ArtifactKind::Csv));
        assert_eq!(ArtifactKind::from_filename("dump.tar.sqlite"), Some(ArtifactKind::Sqlite));
        assert_eq!(ArtifactKind::from_filename("data.txt"), None);
        assert_eq!(ArtifactKind::from_filename("no-extension"), None);
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("uploads");
        assert!(!root.exists());

        let store = ArtifactStore::open(&root).unwrap();
        assert!(store.root().is_dir());
    }

    #[test]
    fn test_save_contains_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let id = Uuid::new_v4();

        assert!(!store.contains(id, ArtifactKind::Csv));

        let path = store.save(id, ArtifactKind::Csv, b"a,b\n1,2\n").unwrap();
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), format!("{id}.csv"));
        assert!(store.contains(id, ArtifactKind::Csv));
        assert!(!store.contains(id, ArtifactKind::Sqlite));

        store.remove(id, ArtifactKind::Csv).unwrap();
        assert!(!store.contains(id, ArtifactKind::Csv));
    }
}
