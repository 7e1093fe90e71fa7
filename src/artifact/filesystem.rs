//! Filesystem utilities for writing image artifacts.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{BuildError, Result};

/// Create the parent directory of `path` if it is missing.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Write `bytes` to `path`, truncating any existing file.
pub fn write_truncate(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| BuildError::io(path, e))
}

/// Atomically move a file by renaming, with fallback to copy+delete when
/// `src` and `dst` are on different filesystems.
///
/// Used for the "atomic artifacts" pattern where we build to a temp file
/// and then move it to the final destination. Any other rename failure is
/// returned as is and leaves `src` in place.
///
/// # Arguments
///
/// * `src` - Source file path
/// * `dst` - Destination file path
pub fn atomic_move(src: &Path, dst: &Path) -> Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(src, dst).map_err(|e| BuildError::io(dst, e))?;
            fs::remove_file(src).map_err(|e| BuildError::io(src, e))?;
            Ok(())
        }
        Err(e) => Err(BuildError::io(dst, e)),
    }
}
