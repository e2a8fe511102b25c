//! Binary references and suffix classification.

use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of file, as decided by its file name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryKind {
    /// Executable program (`.exe`)
    Executable,
    /// Shared library (`.dll`, `.so`, `.so.N`, `.dylib`)
    SharedLibrary,
    /// Anything else; packaged as an auxiliary file
    Other,
}

impl BinaryKind {
    /// Classify a path by its file name suffix.
    ///
    /// Suffix comparison ignores ASCII case, so `APP.EXE` is an executable.
    /// Versioned ELF sonames such as `libssl.so.3` count as shared libraries.
    pub fn classify(path: &Path) -> BinaryKind {
        let Some(name) = path.file_name() else {
            return BinaryKind::Other;
        };
        let name = name.to_string_lossy().to_ascii_lowercase();

        if name.ends_with(".exe") {
            BinaryKind::Executable
        } else if name.ends_with(".dll") || name.ends_with(".dylib") || is_soname(&name) {
            BinaryKind::SharedLibrary
        } else {
            BinaryKind::Other
        }
    }

    /// Whether this kind takes part in dependency resolution.
    pub fn is_binary(self) -> bool {
        !matches!(self, BinaryKind::Other)
    }
}

impl fmt::Display for BinaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryKind::Executable => write!(f, "executable"),
            BinaryKind::SharedLibrary => write!(f, "shared library"),
            BinaryKind::Other => write!(f, "file"),
        }
    }
}

/// `libfoo.so` or `libfoo.so.1.2` (only numeric version components).
fn is_soname(name: &str) -> bool {
    let Some(pos) = name.rfind(".so") else {
        return false;
    };
    let rest = &name[pos + 3..];
    if rest.is_empty() {
        return pos > 0;
    }
    pos > 0
        && rest.starts_with('.')
        && rest[1..]
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

/// A path to an executable or shared library, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryRef {
    path: PathBuf,
    kind: BinaryKind,
}

impl BinaryRef {
    /// Create a reference, classifying the path by suffix.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = BinaryKind::classify(&path);
        BinaryRef { path, kind }
    }

    /// Path on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Suffix classification.
    pub fn kind(&self) -> BinaryKind {
        self.kind
    }

    /// Base file name, lossily converted.
    pub fn file_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }
}

/// Split a list of files into binaries and auxiliary files, preserving order.
pub fn partition_files(files: &[PathBuf]) -> (Vec<BinaryRef>, Vec<PathBuf>) {
    let mut binaries = Vec::new();
    let mut auxiliary = Vec::new();

    for file in files {
        let binary = BinaryRef::new(file.clone());
        if binary.kind().is_binary() {
            binaries.push(binary);
        } else {
            auxiliary.push(file.clone());
        }
    }

    (binaries, auxiliary)
}
