//! Ordered library search directories.
//!
//! Lookups walk the directories in order and stop at the first one holding a
//! file with the requested name. How names compare is controlled by
//! [`NameMatching`], since case sensitivity differs between host filesystems.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

/// How library file names are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameMatching {
    /// Byte-for-byte comparison
    Exact,
    /// Comparison ignoring ASCII letter case only, independent of locale
    IgnoreAsciiCase,
}

impl NameMatching {
    /// Matching used by the host filesystem by default.
    ///
    /// Windows and macOS filesystems are case-insensitive out of the box.
    pub fn host() -> Self {
        if cfg!(any(target_os = "windows", target_os = "macos")) {
            NameMatching::IgnoreAsciiCase
        } else {
            NameMatching::Exact
        }
    }

    /// Whether two file names are considered the same.
    pub fn matches(self, a: &str, b: &str) -> bool {
        match self {
            NameMatching::Exact => a == b,
            NameMatching::IgnoreAsciiCase => a.eq_ignore_ascii_case(b),
        }
    }

    /// Canonical key for a name; equal keys mean matching names.
    pub fn key(self, name: &str) -> String {
        match self {
            NameMatching::Exact => name.to_string(),
            NameMatching::IgnoreAsciiCase => name.to_ascii_lowercase(),
        }
    }
}

impl Default for NameMatching {
    fn default() -> Self {
        NameMatching::host()
    }
}

impl fmt::Display for NameMatching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameMatching::Exact => write!(f, "exact"),
            NameMatching::IgnoreAsciiCase => write!(f, "ignore-ascii-case"),
        }
    }
}

impl FromStr for NameMatching {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(NameMatching::Exact),
            "ignore-ascii-case" | "ignore-case" => Ok(NameMatching::IgnoreAsciiCase),
            _ => Err(format!(
                "invalid name matching '{}'; expected 'exact' or 'ignore-ascii-case'",
                s
            )),
        }
    }
}

/// Ordered list of directories searched for shared libraries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Create a search path from directories, keeping their order.
    ///
    /// Relative directories are made absolute against the current directory
    /// so that resolved library paths are absolute.
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let dirs = dirs
            .into_iter()
            .map(|d| {
                let d = d.into();
                std::path::absolute(&d).unwrap_or(d)
            })
            .collect();
        SearchPath { dirs }
    }

    /// Append a directory at the lowest priority.
    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        self.dirs.push(std::path::absolute(&dir).unwrap_or(dir));
    }

    /// Directories in search order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Whether no directories are configured.
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Find the first file called `name`, in search order.
    ///
    /// With [`NameMatching::IgnoreAsciiCase`] the returned path carries the
    /// on-disk spelling of the file name. Directories that don't exist or
    /// can't be read are skipped. Names with a directory component are never
    /// found, since a dependency name is a bare file name.
    pub fn find(&self, name: &str, matching: NameMatching) -> Option<PathBuf> {
        if !is_bare_name(name) {
            tracing::debug!("{} is not a bare file name, not searching", name);
            return None;
        }
        self.dirs
            .iter()
            .find_map(|dir| find_in_dir(dir, name, matching))
    }
}

fn is_bare_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

fn find_in_dir(dir: &Path, name: &str, matching: NameMatching) -> Option<PathBuf> {
    match matching {
        NameMatching::Exact => {
            let candidate = dir.join(name);
            candidate.is_file().then_some(candidate)
        }
        NameMatching::IgnoreAsciiCase => WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .find(|entry| {
                matching.matches(&entry.file_name().to_string_lossy(), name)
                    && entry.path().is_file()
            })
            .map(walkdir::DirEntry::into_path),
    }
}
