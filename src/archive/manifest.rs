//! The ordered list of files an archive will hold.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::errors::ArchiveError;
use crate::core::NameMatching;
use crate::util::fs::{absolute_path, file_name_string};

/// Why a file is in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryRole {
    /// Entry-point binary given by the caller
    Entry,
    /// Extra binary the caller asked to bundle and resolve
    Extra,
    /// Shared library found by resolution
    Dependency,
    /// Non-binary file
    Auxiliary,
}

impl fmt::Display for EntryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryRole::Entry => write!(f, "entry"),
            EntryRole::Extra => write!(f, "extra"),
            EntryRole::Dependency => write!(f, "dependency"),
            EntryRole::Auxiliary => write!(f, "auxiliary"),
        }
    }
}

/// One file in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Path inside the archive, `<top dir>/<file name>`
    pub archive_path: String,

    /// Absolute path of the file on disk
    pub source: PathBuf,

    /// Why the file is included
    pub role: EntryRole,
}

/// Ordered, flattened archive contents.
///
/// Sources are flattened to their base names. Adding the same source twice
/// is a no-op; adding a different source under a name already taken is an
/// [`ArchiveError::AmbiguousName`].
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveManifest {
    top_dir: String,
    entries: Vec<ManifestEntry>,
    #[serde(skip)]
    matching: NameMatching,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
}

impl ArchiveManifest {
    /// Create an empty manifest rooted at `top_dir`.
    ///
    /// `matching` decides when two file names collide; on case-insensitive
    /// hosts `Helper.dll` and `helper.dll` would extract to the same file.
    pub fn new(top_dir: impl Into<String>, matching: NameMatching) -> Self {
        ArchiveManifest {
            top_dir: top_dir.into(),
            entries: Vec::new(),
            matching,
            by_name: HashMap::new(),
        }
    }

    /// Append a file. Returns `false` if this exact source was already added.
    pub fn push(&mut self, source: &Path, role: EntryRole) -> Result<bool, ArchiveError> {
        let source = absolute_path(source);
        let name = file_name_string(&source).ok_or_else(|| ArchiveError::Source {
            path: source.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        })?;

        let key = self.matching.key(&name);
        if let Some(&index) = self.by_name.get(&key) {
            let existing = &self.entries[index];
            if existing.source == source {
                tracing::debug!("{} already packaged, skipping", source.display());
                return Ok(false);
            }
            return Err(ArchiveError::AmbiguousName {
                name,
                first: existing.source.clone(),
                second: source,
            });
        }

        self.by_name.insert(key, self.entries.len());
        self.entries.push(ManifestEntry {
            archive_path: format!("{}/{}", self.top_dir, name),
            source,
            role,
        });
        Ok(true)
    }

    /// Append several files with the same role, in order.
    pub fn extend<'a, I>(&mut self, sources: I, role: EntryRole) -> Result<(), ArchiveError>
    where
        I: IntoIterator<Item = &'a Path>,
    {
        for source in sources {
            self.push(source, role)?;
        }
        Ok(())
    }

    /// Name of the top-level directory.
    pub fn top_dir(&self) -> &str {
        &self.top_dir
    }

    /// Entries in archive order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Number of files, excluding the top-level directory.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no files were added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Archive-relative paths, in order.
    pub fn archive_paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.archive_path.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::LibraryTree;

    #[test]
    fn test_entries_are_flattened_in_order() {
        let tree = LibraryTree::new();
        let app = tree.file("build/bin/app.exe");
        let foo = tree.file("deps/lib/libfoo.so");
        let readme = tree.file("docs/README.txt");

        let mut manifest = ArchiveManifest::new("app", NameMatching::Exact);
        manifest.push(&app, EntryRole::Entry).unwrap();
        manifest.push(&foo, EntryRole::Dependency).unwrap();
        manifest.push(&readme, EntryRole::Auxiliary).unwrap();

        assert_eq!(
            manifest.archive_paths(),
            vec!["app/app.exe", "app/libfoo.so", "app/README.txt"]
        );
        assert_eq!(manifest.entries()[1].source, foo);
    }

    #[test]
    fn test_same_source_twice_is_deduplicated() {
        let tree = LibraryTree::new();
        let core = tree.file("lib/libcore.so");

        let mut manifest = ArchiveManifest::new("app", NameMatching::Exact);
        assert!(manifest.push(&core, EntryRole::Entry).unwrap());
        assert!(!manifest.push(&core, EntryRole::Dependency).unwrap());

        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.entries()[0].role, EntryRole::Entry);
    }

    #[test]
    fn test_same_name_different_source_is_ambiguous() {
        let tree = LibraryTree::new();
        let a = tree.file("a/helper.dll");
        let b = tree.file("b/helper.dll");

        let mut manifest = ArchiveManifest::new("app", NameMatching::Exact);
        manifest.push(&a, EntryRole::Entry).unwrap();
        let err = manifest.push(&b, EntryRole::Extra).unwrap_err();

        match err {
            ArchiveError::AmbiguousName {
                name,
                first,
                second,
            } => {
                assert_eq!(name, "helper.dll");
                assert_eq!(first, a);
                assert_eq!(second, b);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_case_insensitive_collision() {
        let tree = LibraryTree::new();
        let a = tree.file("a/Helper.dll");
        let b = tree.file("b/helper.DLL");

        let mut exact = ArchiveManifest::new("app", NameMatching::Exact);
        exact.push(&a, EntryRole::Entry).unwrap();
        assert!(exact.push(&b, EntryRole::Entry).is_ok());

        let mut folded = ArchiveManifest::new("app", NameMatching::IgnoreAsciiCase);
        folded.push(&a, EntryRole::Entry).unwrap();
        assert!(matches!(
            folded.push(&b, EntryRole::Entry),
            Err(ArchiveError::AmbiguousName { .. })
        ));
    }
}
