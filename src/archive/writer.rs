//! Writing archives to disk.
//!
//! Archives are written to a temporary file next to the destination and
//! renamed into place once complete, so a reader never sees a half-written
//! archive at the destination path. Entry timestamps are fixed, so the same
//! manifest over the same files always produces the same bytes.

use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::errors::ArchiveError;
use super::manifest::ArchiveManifest;
use super::ArchiveFormat;
use crate::util::fs::write_atomically;
use crate::util::hash::sha256_reader;

const DIR_MODE: u32 = 0o755;
const DEFAULT_FILE_MODE: u32 = 0o644;

/// Internal failure while the temporary archive is open.
enum WriteFailure {
    Io(io::Error),
    Source(PathBuf, io::Error),
}

impl From<io::Error> for WriteFailure {
    fn from(e: io::Error) -> Self {
        WriteFailure::Io(e)
    }
}

impl From<zip::result::ZipError> for WriteFailure {
    fn from(e: zip::result::ZipError) -> Self {
        WriteFailure::Io(io::Error::other(e))
    }
}

/// Write `manifest` as an archive at `archive_path`.
///
/// Any existing file at `archive_path` is replaced only on success. Returns
/// the hex SHA-256 of the written archive.
pub fn write_archive(
    archive_path: &Path,
    format: ArchiveFormat,
    manifest: &ArchiveManifest,
) -> Result<String, ArchiveError> {
    let result = write_atomically(archive_path, |file| {
        match format {
            ArchiveFormat::Zip => write_zip(file, manifest)?,
            ArchiveFormat::TarGz => write_tar_gz(file, manifest)?,
        }
        file.seek(SeekFrom::Start(0))?;
        Ok::<_, WriteFailure>(sha256_reader(&mut *file)?)
    });

    match result {
        Ok(digest) => {
            tracing::info!(
                "wrote {} ({} files, {})",
                archive_path.display(),
                manifest.len(),
                format
            );
            Ok(digest)
        }
        Err(WriteFailure::Io(source)) => Err(ArchiveError::Write {
            path: archive_path.to_path_buf(),
            source,
        }),
        Err(WriteFailure::Source(path, source)) => Err(ArchiveError::Source { path, source }),
    }
}

fn open_source(path: &Path) -> Result<(File, u32), WriteFailure> {
    let file = File::open(path).map_err(|e| WriteFailure::Source(path.to_path_buf(), e))?;
    let mode = file
        .metadata()
        .map(|m| file_mode(&m))
        .map_err(|e| WriteFailure::Source(path.to_path_buf(), e))?;
    Ok((file, mode))
}

#[cfg(unix)]
fn file_mode(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn file_mode(_meta: &std::fs::Metadata) -> u32 {
    DEFAULT_FILE_MODE
}

fn write_zip(file: &mut File, manifest: &ArchiveManifest) -> Result<(), WriteFailure> {
    let mut zip = ZipWriter::new(&mut *file);
    let base = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    zip.add_directory(
        format!("{}/", manifest.top_dir()),
        base.unix_permissions(DIR_MODE),
    )?;

    for entry in manifest.entries() {
        let (mut src, mode) = open_source(&entry.source)?;
        zip.start_file(entry.archive_path.as_str(), base.unix_permissions(mode))?;
        io::copy(&mut src, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}

fn write_tar_gz(file: &mut File, manifest: &ArchiveManifest) -> Result<(), WriteFailure> {
    let encoder = GzEncoder::new(&mut *file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.mode(tar::HeaderMode::Deterministic);

    let mut dir = tar::Header::new_gnu();
    dir.set_entry_type(tar::EntryType::Directory);
    dir.set_mode(DIR_MODE);
    dir.set_size(0);
    dir.set_mtime(0);
    builder.append_data(&mut dir, format!("{}/", manifest.top_dir()), io::empty())?;

    for entry in manifest.entries() {
        let (mut src, _) = open_source(&entry.source)?;
        builder.append_file(&entry.archive_path, &mut src)?;
    }

    builder.into_inner()?.finish()?;
    Ok(())
}
