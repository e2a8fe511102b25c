//! Test fixtures for common test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory tree of placeholder binaries and files.
///
/// The directory is removed when the fixture is dropped.
#[derive(Debug)]
pub struct LibraryTree {
    tmp: TempDir,
}

impl LibraryTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        LibraryTree {
            tmp: TempDir::new().unwrap(),
        }
    }

    /// Root of the tree.
    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Absolute path of `rel` inside the tree, without creating it.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.tmp.path().join(rel)
    }

    /// Create a directory and return its path.
    pub fn dir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Create a file whose contents name its own relative path.
    ///
    /// Distinct contents make it easy to tell in an archive which copy of a
    /// same-named library was packaged.
    pub fn file(&self, rel: &str) -> PathBuf {
        self.file_with(rel, format!("contents of {}", rel))
    }

    /// Create a file with explicit contents.
    pub fn file_with(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }
}

impl Default for LibraryTree {
    fn default() -> Self {
        LibraryTree::new()
    }
}

/// Entry names of a zip archive, in archive order.
pub fn zip_entry_names(archive: &Path) -> Vec<String> {
    let file = fs::File::open(archive).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Contents of one entry of a zip archive, as text.
pub fn zip_entry_text(archive: &Path, name: &str) -> String {
    use std::io::Read;

    let file = fs::File::open(archive).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    text
}

/// Entry names of a gzip-compressed tar archive, in archive order.
pub fn tar_gz_entry_names(archive: &Path) -> Vec<String> {
    let file = fs::File::open(archive).unwrap();
    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(file));
    tar.entries()
        .unwrap()
        .map(|e| {
            let e = e.unwrap();
            let path = e.path().unwrap().to_string_lossy().into_owned();
            if e.header().entry_type().is_dir() && !path.ends_with('/') {
                format!("{}/", path)
            } else {
                path
            }
        })
        .collect()
}
