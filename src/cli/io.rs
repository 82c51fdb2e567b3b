use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::CodemodError;

static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replaces `path` with `contents` through an adjacent temporary file, keeping permissions.
pub(super) fn write_text_atomically(path: &Path, contents: &str) -> Result<(), CodemodError> {
    let target_permissions = fs::metadata(path)
        .map_err(|error| CodemodError::io(path, error))?
        .permissions();
    let (temp_path, mut temp_file) = create_temp_file_adjacent(path)?;

    let result = (|| {
        temp_file
            .write_all(contents.as_bytes())
            .map_err(|error| CodemodError::io(&temp_path, error))?;
        temp_file
            .sync_all()
            .map_err(|error| CodemodError::io(&temp_path, error))?;
        fs::set_permissions(&temp_path, target_permissions.clone())
            .map_err(|error| CodemodError::io(&temp_path, error))?;
        drop(temp_file);

        fs::rename(&temp_path, path).map_err(|error| CodemodError::io(path, error))?;
        sync_parent_directory(path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn create_temp_file_adjacent(path: &Path) -> Result<(PathBuf, File), CodemodError> {
    let parent = resolve_parent_directory(path);
    let file_name = path
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or("ava-to-jest-target");

    for _ in 0..64 {
        let counter = TEMP_FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_nanos());
        let temp_path = parent.join(format!(".{file_name}.ava-to-jest-tmp-{nanos}-{counter}"));

        match OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
        {
            Ok(file) => return Ok((temp_path, file)),
            Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(error) => return Err(CodemodError::io(&temp_path, error)),
        }
    }

    Err(CodemodError::InvalidRequest {
        message: format!(
            "Failed to allocate an adjacent temporary file for '{}'",
            path.display()
        ),
    })
}

fn resolve_parent_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn sync_parent_directory(path: &Path) -> Result<(), CodemodError> {
    #[cfg(unix)]
    {
        let parent = resolve_parent_directory(path);
        let directory_handle =
            File::open(&parent).map_err(|error| CodemodError::io(&parent, error))?;
        directory_handle
            .sync_all()
            .map_err(|error| CodemodError::io(&parent, error))
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}
