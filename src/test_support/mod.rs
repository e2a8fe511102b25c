//! Test utilities and mocks for distpack unit tests.
//!
//! Real import tables need real binaries and binutils. Tests instead lay out
//! placeholder files on disk and describe their imports with a
//! [`FakeInspector`].
//!
//! # Example
//!
//! ```rust,ignore
//! use distpack::test_support::{FakeInspector, LibraryTree};
//!
//! #[test]
//! fn test_example() {
//!     let tree = LibraryTree::new();
//!     let app = tree.file("bin/app.exe");
//!     let foo = tree.file("lib/libfoo.so");
//!
//!     let inspector = FakeInspector::new()
//!         .with_binary(&app, ["libfoo.so"])
//!         .with_binary(&foo, Vec::<&str>::new());
//! }
//! ```

pub mod fixtures;

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::inspect::{DependencyInspector, InspectError};

pub use fixtures::*;

/// Table-driven inspector.
///
/// Paths are compared after making them absolute. Paths missing from the
/// table are reported as unrecognized formats, like a text file handed to
/// `objdump`.
#[derive(Debug, Default)]
pub struct FakeInspector {
    imports: HashMap<PathBuf, BTreeSet<String>>,
    calls: RefCell<Vec<PathBuf>>,
}

impl FakeInspector {
    /// Create an inspector that knows no binaries.
    pub fn new() -> Self {
        FakeInspector::default()
    }

    /// Declare the imports of a binary.
    pub fn with_binary<I, S>(mut self, path: &Path, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports.insert(
            absolute(path),
            imports.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// How many times `path` was inspected.
    pub fn call_count(&self, path: &Path) -> usize {
        let path = absolute(path);
        self.calls.borrow().iter().filter(|p| **p == path).count()
    }
}

impl DependencyInspector for FakeInspector {
    fn declared_dependencies(&self, binary: &Path) -> Result<BTreeSet<String>, InspectError> {
        let path = absolute(binary);
        self.calls.borrow_mut().push(path.clone());

        self.imports
            .get(&path)
            .cloned()
            .ok_or_else(|| InspectError::UnrecognizedFormat {
                path,
                detail: "file format not recognized".to_string(),
            })
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
