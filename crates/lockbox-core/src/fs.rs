//! Filesystem utilities for atomic operations.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{LockboxError, Result};

/// Atomically rename a file, with fallback for platforms where rename fails if target exists.
///
/// On some platforms (notably Windows), `fs::rename` fails if the destination already exists.
/// This function handles that case by removing the destination first and retrying.
///
/// If the rename ultimately fails, the temp file is cleaned up.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        // Best-effort replace on platforms where rename fails if target exists.
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

/// Write `data` to `path` through a synced sibling temp file and a rename.
///
/// Readers observe either the previous contents or the new contents, never a
/// partially written file. Missing parent directories are created.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| {
        LockboxError::Storage(format!(
            "Failed to create directory {}: {}",
            parent.display(),
            e
        ))
    })?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LockboxError::Storage(format!("System time error: {}", e)))?
        .as_nanos();
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| LockboxError::Storage("Invalid store filename".to_string()))?;
    let temp_path = parent.join(format!(".{}.{}.tmp", filename, nanos));

    let written = open_private_temp(&temp_path).and_then(|mut file| {
        file.write_all(data)
            .and_then(|()| file.sync_all())
            .map_err(|e| LockboxError::Storage(format!("Temp file write failed: {}", e)))
    });
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    rename_with_fallback(&temp_path, path)
        .map_err(|e| LockboxError::Storage(format!("Atomic rename failed: {}", e)))?;

    Ok(())
}

/// Copy `source` to `destination` atomically, returning the number of bytes copied.
pub fn copy_atomic(source: &Path, destination: &Path) -> Result<u64> {
    let data = fs::read(source).map_err(|e| {
        LockboxError::Storage(format!("Failed to read {}: {}", source.display(), e))
    })?;
    write_atomic(destination, &data)?;
    Ok(data.len() as u64)
}

/// Create a new temp file readable by the owner only from the first byte.
fn open_private_temp(temp_path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
        .open(temp_path)
        .map_err(|e| LockboxError::Storage(format!("Temp file create failed: {}", e)))
}
