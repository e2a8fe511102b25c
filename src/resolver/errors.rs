//! Resolution error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::inspect::InspectError;
use crate::util::diagnostic::Diagnostic;

/// Error during shared-library resolution.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ResolveError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Inspection(#[from] InspectError),

    #[error("{} unresolved dependencies", names.len())]
    #[diagnostic(
        code(distpack::resolve::unresolved),
        help("add the directories holding these libraries to the search path")
    )]
    Unresolved {
        names: Vec<String>,
        search_path: Vec<PathBuf>,
    },

    #[error("invalid system library pattern `{pattern}`: {message}")]
    #[diagnostic(code(distpack::resolve::invalid_pattern))]
    InvalidPattern { pattern: String, message: String },
}

impl ResolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::Inspection(err) => err.to_diagnostic(),

            ResolveError::Unresolved { names, search_path } => {
                let mut diag = Diagnostic::error(format!(
                    "could not resolve {} shared-library {}",
                    names.len(),
                    if names.len() == 1 { "dependency" } else { "dependencies" }
                ));

                for name in names {
                    diag = diag.with_context(format!("`{}` not found", name));
                }

                if search_path.is_empty() {
                    diag = diag.with_context("the search path is empty");
                } else {
                    let dirs: Vec<String> =
                        search_path.iter().map(|d| d.display().to_string()).collect();
                    diag = diag.with_context(format!("searched: {}", dirs.join(", ")));
                }

                diag.with_suggestion("Add the directory containing the library with --search-path")
                    .with_suggestion(
                        "List libraries the target system provides under `system_libraries`",
                    )
                    .with_suggestion("Use `--unresolved warn` to package without them")
            }

            ResolveError::InvalidPattern { pattern, message } => {
                Diagnostic::error(format!("invalid system library pattern `{}`", pattern))
                    .with_context(message.clone())
                    .with_suggestion("Patterns use glob syntax, e.g. `libc.so.*`")
            }
        }
    }
}
