//! Filesystem utilities.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Make a path absolute against the current directory without touching the
/// filesystem. Symlinks are kept, so the file name stays as given.
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Base file name of `path` as a string, if it has one.
pub fn file_name_string(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Write a file through a temporary sibling and rename it into place.
///
/// `write` receives the open temporary file. The destination only changes if
/// `write` succeeds and the rename succeeds; otherwise the temporary file is
/// removed and any existing destination is left as it was. Returns whatever
/// `write` returned.
pub fn write_atomically<T, E, F>(dest: &Path, write: F) -> Result<T, E>
where
    F: FnOnce(&mut File) -> Result<T, E>,
    E: From<io::Error>,
{
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let mut tmp = NamedTempFile::new_in(&parent)?;
    let value = write(tmp.as_file_mut())?;
    #[cfg(unix)]
    tmp.as_file().set_permissions(output_permissions(dest))?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(value)
}

/// Mode for a file replacing `dest`: the mode `dest` already has, or
/// world-readable for a new file. Temporary files start out owner-only.
#[cfg(unix)]
fn output_permissions(dest: &Path) -> std::fs::Permissions {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::metadata(dest) {
        Ok(meta) if meta.is_file() => meta.permissions(),
        _ => std::fs::Permissions::from_mode(NEW_FILE_MODE),
    }
}

#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Write a string to a file unless it already holds exactly that content.
///
/// Returns `true` if the file was written. Leaving an identical file alone
/// keeps its timestamp, so build tools don't rebuild its dependents.
pub fn write_if_changed(path: &Path, contents: &str) -> io::Result<bool> {
    if let Ok(existing) = std::fs::read_to_string(path) {
        if existing == contents {
            return Ok(false);
        }
    }

    write_atomically(path, |file| {
        use std::io::Write;
        file.write_all(contents.as_bytes())
    })?;

    Ok(true)
}
