//! Atomic replacement of the stripped file.
//!
//! The output is written to a temporary file in the same directory as the
//! original, given the original's permission bits, and renamed over it. If
//! anything fails before the rename, the temporary file is removed and the
//! original is left untouched.

use std::fs::{self, File, Permissions};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::error::Result;

/// Replaces the file at `path` with whatever `write` puts into a fresh file.
pub fn replace_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mode = fs::metadata(path)?.permissions().mode() & 0o777;

    let mut prefix = name.to_os_string();
    prefix.push(":ustrip:");
    // Dropping `temp` on any early return deletes the file.
    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .tempfile_in(dir)?;
    tracing::debug!("writing to {}", temp.path().display());

    fs::set_permissions(temp.path(), Permissions::from_mode(mode))?;
    write(temp.as_file_mut())?;
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}
