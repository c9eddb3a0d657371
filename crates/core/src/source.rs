//! Corpus source abstraction for filesystem-independent compilation.
//!
//! The [`CorpusSource`] trait abstracts file I/O so the compiler can run
//! against an installed ConTeXt tree or an in-memory corpus in tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Trait that abstracts file I/O for the loader.
///
/// Implementations read raw bytes (decoding is the parser's job), report
/// whether a path names a file, and list the files of a directory.
pub trait CorpusSource {
    /// Read the raw bytes of a file.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, std::io::Error>;

    /// Whether `path` names a readable file.
    fn is_file(&self, path: &Path) -> bool;

    /// List the files directly inside `dir`, sorted by path. A missing
    /// directory yields an empty list.
    fn list_files(&self, dir: &Path) -> Vec<PathBuf>;
}

/// Default filesystem-backed source.
pub struct FileSystemSource;

impl CorpusSource for FileSystemSource {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, std::io::Error> {
        std::fs::read(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn list_files(&self, dir: &Path) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        files
    }
}

/// In-memory source for testing.
///
/// Maps normalized paths to file contents.
#[derive(Default)]
pub struct InMemorySource {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder style.
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert(Self::normalize_path(path.as_ref()), contents.into());
        self
    }

    /// Normalize a path by resolving `.` and `..` components without
    /// touching the filesystem.
    fn normalize_path(path: &Path) -> PathBuf {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                std::path::Component::CurDir => {}
                std::path::Component::ParentDir => {
                    components.pop();
                }
                other => components.push(other),
            }
        }
        components.iter().collect()
    }
}

impl CorpusSource for InMemorySource {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, std::io::Error> {
        let normalized = Self::normalize_path(path);
        self.files.get(&normalized).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found in memory: {}", normalized.display()),
            )
        })
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&Self::normalize_path(path))
    }

    fn list_files(&self, dir: &Path) -> Vec<PathBuf> {
        let dir = Self::normalize_path(dir);
        self.files
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_resolves_dot_and_dotdot() {
        let p = Path::new("/a/b/../c/./d");
        let normalized = InMemorySource::normalize_path(p);
        assert_eq!(normalized, PathBuf::from("/a/c/d"));
    }

    #[test]
    fn in_memory_read_found() {
        let source = InMemorySource::new().with_file("/corpus/i-test.xml", "<interface/>");
        let bytes = source.read_bytes(Path::new("/corpus/./i-test.xml")).unwrap();
        assert_eq!(bytes, b"<interface/>");
    }

    #[test]
    fn in_memory_read_not_found() {
        let source = InMemorySource::new();
        let err = source.read_bytes(Path::new("/missing.xml")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn in_memory_lists_direct_children_only() {
        let source = InMemorySource::new()
            .with_file("/corpus/modules/b.xml", "")
            .with_file("/corpus/modules/a.xml", "")
            .with_file("/corpus/modules/deep/c.xml", "")
            .with_file("/corpus/i-context.xml", "");
        let files = source.list_files(Path::new("/corpus/modules"));
        assert_eq!(
            files,
            vec![
                PathBuf::from("/corpus/modules/a.xml"),
                PathBuf::from("/corpus/modules/b.xml"),
            ]
        );
    }

    #[test]
    fn filesystem_lists_missing_dir_as_empty() {
        let files = FileSystemSource.list_files(Path::new("/definitely/not/here"));
        assert!(files.is_empty());
    }
}
