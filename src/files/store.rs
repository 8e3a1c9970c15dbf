//! Blocking file helpers used by the file routes.
//!
//! Writes are not coordinated across connections: two requests saving the
//! same path race at the file-system level.

use std::fs;
use std::io;
use std::path::Path;

/// Reads a whole file. A missing path (or a directory) is `Ok(None)`.
pub fn read_file(path: &Path) -> io::Result<Option<Vec<u8>>> {
    if !path.is_file() {
        return Ok(None);
    }

    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Writes `content` to `path`, creating missing parent directories.
pub fn save_file(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)
}

/// Removes a file. Returns `false` if there was nothing to remove.
pub fn delete_file(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
