use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use spdlog::{debug, info};

use crate::error::PublishError;

pub fn ensure_dir(dir: &Path) -> Result<(), PublishError> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| PublishError::Io(dir.to_path_buf(), e))?;
    debug!("Created directory {}", dir.display());
    Ok(())
}

/// Writes an output artifact, creating the parent directories it needs.
pub fn write_file(path: &Path, data: &str) -> Result<(), PublishError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, data).map_err(|e| PublishError::Io(path.to_path_buf(), e))?;
    info!("Written {}", path.display());
    Ok(())
}

/// Replaces the content of `path` through a sibling temporary file, so a
/// crash never leaves a half written source file behind.
pub fn replace_file(path: &Path, data: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)
}

/// Moves `from` to `to`. The source is only removed once the copy succeeded.
pub fn move_file(from: &Path, to: &Path) -> Result<(), PublishError> {
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(from, to).map_err(|e| PublishError::Io(to.to_path_buf(), e))?;
    fs::remove_file(from).map_err(|e| PublishError::Io(from.to_path_buf(), e))?;
    info!("Moved {} to {}", from.display(), to.display());
    Ok(())
}

/// Files directly inside `dir` with the given extension, sorted by name. A
/// missing directory has no files.
pub fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, PublishError> {
    if !dir.is_dir() {
        return Ok(vec![]);
    }

    let entries = fs::read_dir(dir).map_err(|e| PublishError::Io(dir.to_path_buf(), e))?;
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().map(|ext| ext == extension).unwrap_or(false))
        .collect();
    files.sort();
    Ok(files)
}

pub fn modified_time(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}
