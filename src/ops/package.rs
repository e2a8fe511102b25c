//! Packaging operation.
//!
//! Resolves the shared libraries an application needs at run time and writes
//! them, together with the application itself and its auxiliary files, into
//! a single flat archive.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::archive::{write_archive, ArchiveError, ArchiveFormat, ArchiveManifest, EntryRole};
use crate::core::{partition_files, SearchPath};
use crate::inspect::DependencyInspector;
use crate::resolver::{resolve, Resolution, ResolveError, ResolveOptions};
use crate::util::diagnostic::Diagnostic;

/// Files to package.
#[derive(Debug, Clone, Default)]
pub struct PackageInputs {
    /// Destination archive
    pub archive_path: PathBuf,

    /// Files classified by suffix into binaries and auxiliary files
    pub entry_files: Vec<PathBuf>,

    /// Binaries that are resolved and packaged whatever their suffix
    pub extra_binaries: Vec<PathBuf>,

    /// Files packaged as-is, never inspected
    pub auxiliary_files: Vec<PathBuf>,
}

impl PackageInputs {
    /// Create inputs for `archive_path` with no files.
    pub fn new(archive_path: impl Into<PathBuf>) -> Self {
        PackageInputs {
            archive_path: archive_path.into(),
            ..Default::default()
        }
    }

    /// Add files to classify by suffix.
    pub fn with_entry_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.entry_files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Add binaries to resolve regardless of suffix.
    pub fn with_extra_binaries<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.extra_binaries.extend(files.into_iter().map(Into::into));
        self
    }

    /// Add auxiliary files.
    pub fn with_auxiliary_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.auxiliary_files.extend(files.into_iter().map(Into::into));
        self
    }
}

/// Options for packaging.
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    /// Directories searched for dependencies, in order
    pub search_path: SearchPath,

    /// Resolution settings
    pub resolve: ResolveOptions,

    /// Archive format; detected from the archive extension when `None`
    pub format: Option<ArchiveFormat>,

    /// Compose the manifest without writing the archive
    pub dry_run: bool,
}

impl PackageOptions {
    /// Create options searching `search_path`.
    pub fn new(search_path: SearchPath) -> Self {
        PackageOptions {
            search_path,
            ..Default::default()
        }
    }

    /// Set the resolution settings.
    pub fn with_resolve_options(mut self, resolve: ResolveOptions) -> Self {
        self.resolve = resolve;
        self
    }

    /// Force an archive format.
    pub fn with_format(mut self, format: ArchiveFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Set dry run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Result of a packaging run.
#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    /// Archive that was (or, in a dry run, would be) written
    pub archive_path: PathBuf,

    /// Format used
    pub format: ArchiveFormat,

    /// Archive contents in order
    pub manifest: ArchiveManifest,

    /// Resolution the manifest was built from
    pub resolution: Resolution,

    /// SHA-256 of the archive; `None` for a dry run
    pub sha256: Option<String>,
}

/// Error while packaging.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum PackageError {
    #[error("input file not found: {}", path.display())]
    #[diagnostic(
        code(distpack::package::missing_input),
        help("every input must be an existing file")
    )]
    MissingInput { path: PathBuf },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Archive(#[from] ArchiveError),
}

impl PackageError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            PackageError::MissingInput { path } => {
                Diagnostic::error(format!("input file not found: {}", path.display()))
                    .with_context("no archive was written")
                    .with_suggestion("Check that the build produced this file")
            }
            PackageError::Resolve(err) => err.to_diagnostic(),
            PackageError::Archive(err) => err.to_diagnostic(),
        }
    }
}

/// Package an application into a single archive.
///
/// Binaries among `entry_files` and every extra binary are resolved against
/// the search path in one run. The archive lists entry binaries first, then
/// extra binaries, then resolved dependencies sorted by name, then auxiliary
/// files. Nothing is written unless every step succeeds.
pub fn package<I>(
    inputs: &PackageInputs,
    opts: &PackageOptions,
    inspector: &I,
) -> Result<PackageReport, PackageError>
where
    I: DependencyInspector + ?Sized,
{
    let (binaries, classified_aux) = partition_files(&inputs.entry_files);

    for path in inputs
        .entry_files
        .iter()
        .chain(&inputs.extra_binaries)
        .chain(&inputs.auxiliary_files)
    {
        if !path.is_file() {
            return Err(PackageError::MissingInput { path: path.clone() });
        }
    }

    let format = match opts.format {
        Some(format) => format,
        None => ArchiveFormat::from_path(&inputs.archive_path).ok_or_else(|| {
            ArchiveError::UnsupportedFormat {
                path: inputs.archive_path.clone(),
            }
        })?,
    };
    let top_dir =
        format
            .top_level_dir(&inputs.archive_path)
            .ok_or_else(|| ArchiveError::InvalidName {
                path: inputs.archive_path.clone(),
            })?;

    let mut seeds: Vec<PathBuf> = binaries.iter().map(|b| b.path().to_path_buf()).collect();
    seeds.extend(inputs.extra_binaries.iter().cloned());

    tracing::debug!(
        "resolving {} binaries against {} search directories",
        seeds.len(),
        opts.search_path.dirs().len()
    );
    let resolution = resolve(&seeds, &opts.search_path, &opts.resolve, inspector)?;

    let mut manifest = ArchiveManifest::new(top_dir, opts.resolve.matching);
    manifest.extend(binaries.iter().map(|b| b.path()), EntryRole::Entry)?;
    manifest.extend(
        inputs.extra_binaries.iter().map(PathBuf::as_path),
        EntryRole::Extra,
    )?;
    manifest.extend(
        resolution.resolved.values().map(PathBuf::as_path),
        EntryRole::Dependency,
    )?;
    manifest.extend(
        classified_aux
            .iter()
            .chain(&inputs.auxiliary_files)
            .map(PathBuf::as_path),
        EntryRole::Auxiliary,
    )?;

    let sha256 = if opts.dry_run {
        for entry in manifest.entries() {
            tracing::info!(
                "[dry-run] would add {} ({})",
                entry.archive_path,
                entry.role
            );
        }
        None
    } else {
        Some(write_archive(&inputs.archive_path, format, &manifest)?)
    };

    Ok(PackageReport {
        archive_path: inputs.archive_path.clone(),
        format,
        manifest,
        resolution,
        sha256,
    })
}

/// Format a report as human-readable text.
pub fn format_report(report: &PackageReport) -> String {
    let mut out = String::new();

    let verb = if report.sha256.is_some() {
        "Packaged"
    } else {
        "Would package"
    };
    out.push_str(&format!(
        "{} {} files into {}\n",
        verb,
        report.manifest.len(),
        report.archive_path.display()
    ));

    for entry in report.manifest.entries() {
        out.push_str(&format!(
            "  {:<10} {}\n",
            entry.role.to_string(),
            entry.archive_path
        ));
    }

    if !report.resolution.skipped.is_empty() {
        out.push_str(&format!(
            "System libraries (not packaged): {}\n",
            join(&report.resolution.skipped)
        ));
    }
    if !report.resolution.unresolved.is_empty() {
        out.push_str(&format!(
            "Unresolved (not packaged): {}\n",
            join(&report.resolution.unresolved)
        ));
    }
    if let Some(sha) = &report.sha256 {
        out.push_str(&format!("sha256: {}\n", sha));
    }

    out
}

fn join<'a>(names: impl IntoIterator<Item = &'a String>) -> String {
    names
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
