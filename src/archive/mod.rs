//! Distributable archives.
//!
//! An archive holds exactly one top-level directory, named after the archive
//! file without its extension, with every packaged file directly inside it.

pub mod errors;
pub mod manifest;
pub mod writer;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use errors::ArchiveError;
pub use manifest::{ArchiveManifest, EntryRole, ManifestEntry};
pub use writer::write_archive;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFormat {
    /// Deflate-compressed zip
    #[default]
    Zip,
    /// Gzip-compressed tar
    TarGz,
}

impl ArchiveFormat {
    /// Detect the format from the archive file name.
    pub fn from_path(path: &Path) -> Option<ArchiveFormat> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else {
            None
        }
    }

    /// File name extensions, longest first.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ArchiveFormat::Zip => &[".zip"],
            ArchiveFormat::TarGz => &[".tar.gz", ".tgz"],
        }
    }

    /// Name of the single top-level directory for an archive at `path`.
    ///
    /// The format's extension is stripped when present; otherwise the last
    /// extension is. Returns `None` when nothing would be left.
    pub fn top_level_dir(self, path: &Path) -> Option<String> {
        let name = path.file_name()?.to_string_lossy().into_owned();
        let lowered = name.to_ascii_lowercase();

        let stem = self
            .extensions()
            .iter()
            .find(|ext| lowered.ends_with(*ext))
            .map(|ext| name[..name.len() - ext.len()].to_string())
            .or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
            })?;

        (!stem.is_empty()).then_some(stem)
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::Zip => write!(f, "zip"),
            ArchiveFormat::TarGz => write!(f, "tar-gz"),
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar-gz" | "tar.gz" | "tgz" => Ok(ArchiveFormat::TarGz),
            _ => Err(format!(
                "invalid archive format '{}'; expected 'zip' or 'tar-gz'",
                s
            )),
        }
    }
}
