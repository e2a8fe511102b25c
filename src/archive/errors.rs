//! Archive error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Error while composing or writing an archive.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ArchiveError {
    #[error("two different files would be packaged as `{name}`")]
    #[diagnostic(
        code(distpack::archive::ambiguous_name),
        help("archives are flat, so every packaged file needs a unique file name")
    )]
    AmbiguousName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("cannot determine archive format of {}", path.display())]
    #[diagnostic(
        code(distpack::archive::unsupported_format),
        help("use a .zip, .tar.gz or .tgz file name, or pass --format")
    )]
    UnsupportedFormat { path: PathBuf },

    #[error("archive path {} has no usable file name", path.display())]
    #[diagnostic(code(distpack::archive::invalid_name))]
    InvalidName { path: PathBuf },

    #[error("failed to read {}", path.display())]
    #[diagnostic(code(distpack::archive::source))]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write archive {}", path.display())]
    #[diagnostic(code(distpack::archive::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ArchiveError::AmbiguousName {
                name,
                first,
                second,
            } => Diagnostic::error(format!(
                "two different files would be packaged as `{}`",
                name
            ))
            .with_context(format!("first: {}", first.display()))
            .with_context(format!("second: {}", second.display()))
            .with_context("no archive was written")
            .with_suggestion("Rename one of the files")
            .with_suggestion("Remove the duplicate from the inputs or the search path"),

            ArchiveError::UnsupportedFormat { path } => {
                Diagnostic::error(format!("unknown archive extension: {}", path.display()))
                    .with_suggestion("Use a .zip, .tar.gz or .tgz file name")
                    .with_suggestion("Pass --format zip or --format tar-gz")
            }

            ArchiveError::InvalidName { path } => Diagnostic::error(format!(
                "cannot name the top-level directory after {}",
                path.display()
            ))
            .with_suggestion("Give the archive a file name such as `app.zip`"),

            ArchiveError::Source { path, source } => {
                Diagnostic::error(format!("failed to read {}", path.display()))
                    .with_context(source.to_string())
                    .with_context("no archive was written")
            }

            ArchiveError::Write { path, source } => {
                Diagnostic::error(format!("failed to write archive {}", path.display()))
                    .with_context(source.to_string())
                    .with_context("any previous archive at this path was left untouched")
                    .with_suggestion("Check free disk space and write permissions")
            }
        }
    }
}
