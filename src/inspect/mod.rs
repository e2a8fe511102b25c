//! Binary dependency inspection.
//!
//! An inspector reads one executable or shared library and reports the
//! shared-library names it imports. It never searches for those libraries;
//! that is the resolver's job.

pub mod tool;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

pub use tool::{parse_objdump_output, parse_readelf_output, InspectorTool, ToolInspector};

/// Reads the import table of a single binary.
pub trait DependencyInspector {
    /// Shared-library names declared as imports by `binary`.
    ///
    /// Fails rather than returning an empty set when `binary` is not a
    /// recognized binary format.
    fn declared_dependencies(&self, binary: &Path) -> Result<BTreeSet<String>, InspectError>;
}

impl<T: DependencyInspector + ?Sized> DependencyInspector for &T {
    fn declared_dependencies(&self, binary: &Path) -> Result<BTreeSet<String>, InspectError> {
        (**self).declared_dependencies(binary)
    }
}

impl<T: DependencyInspector + ?Sized> DependencyInspector for Box<T> {
    fn declared_dependencies(&self, binary: &Path) -> Result<BTreeSet<String>, InspectError> {
        (**self).declared_dependencies(binary)
    }
}

/// Failure to read a binary's imports.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum InspectError {
    #[error("binary not found: {}", path.display())]
    #[diagnostic(code(distpack::inspect::not_found))]
    NotFound { path: PathBuf },

    #[error("not a recognized binary format: {}", path.display())]
    #[diagnostic(
        code(distpack::inspect::unrecognized_format),
        help("only executables and shared libraries can be inspected")
    )]
    UnrecognizedFormat { path: PathBuf, detail: String },

    #[error("inspection tool `{tool}` not found")]
    #[diagnostic(
        code(distpack::inspect::tool_unavailable),
        help("install binutils or set `inspector_path` in .distpack/config.toml")
    )]
    ToolUnavailable { tool: String },

    #[error("`{command}` failed with exit code {status:?}")]
    #[diagnostic(code(distpack::inspect::tool_failed))]
    ToolFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("failed to run `{command}`")]
    #[diagnostic(code(distpack::inspect::io))]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl InspectError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            InspectError::NotFound { path } => {
                Diagnostic::error(format!("cannot inspect `{}`: file does not exist", path.display()))
                    .with_suggestion("Check that the binary was built before packaging")
            }

            InspectError::UnrecognizedFormat { path, detail } => {
                let mut diag = Diagnostic::error(format!(
                    "`{}` is not a recognized executable or shared library",
                    path.display()
                ))
                .with_location(path);

                if !detail.is_empty() {
                    diag = diag.with_context(detail.clone());
                }

                diag.with_suggestion(
                    "Pass non-binary files as auxiliary files (--aux) instead",
                )
            }

            InspectError::ToolUnavailable { tool } => {
                Diagnostic::error(format!("could not find `{}` in PATH", tool))
                    .with_suggestion("Install binutils (provides objdump and readelf)")
                    .with_suggestion("Point `inspector_path` at the tool in .distpack/config.toml")
            }

            InspectError::ToolFailed {
                command,
                status,
                stderr,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "`{}` exited with code {:?}",
                    command, status
                ));
                for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
                    diag = diag.with_context(line.trim().to_string());
                }
                diag
            }

            InspectError::Io { command, source } => {
                Diagnostic::error(format!("failed to run `{}`: {}", command, source))
            }
        }
    }
}
