use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-process counter so two writers targeting the same file never share a temp file.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Read a file to string, replacing invalid UTF-8 sequences with the replacement character.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_to_string_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Atomically write bytes to a file by writing to a temp file then renaming.
///
/// Readers observe either the previous contents or the complete new contents,
/// never a partially written file. The parent directory must exist.
///
/// # Errors
/// Returns an error if the write or rename fails.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));

    // Same directory as the target so the rename stays on one filesystem
    let temp_path = parent.join(format!(
        ".{}.tmp.{}.{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("file"),
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    match fs::rename(&temp_path, path) {
        Ok(()) => Ok(()),
        Err(e) => {
            // Windows refuses to rename over an existing file
            if cfg!(windows) {
                fs::copy(&temp_path, path)?;
                let _ = fs::remove_file(&temp_path);
                Ok(())
            } else {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }
}

/// Copy `src` to `dst` through [`atomic_write`].
///
/// Returns the number of bytes copied.
///
/// # Errors
/// Returns an error if `src` cannot be read or `dst` cannot be written.
pub fn atomic_copy(src: &Path, dst: &Path) -> io::Result<u64> {
    let bytes = fs::read(src)?;
    atomic_write(dst, &bytes)?;
    Ok(bytes.len() as u64)
}

/// Remove a directory tree, treating a missing directory as success.
///
/// Returns `true` if something was removed.
///
/// # Errors
/// Returns an error if the directory exists but cannot be removed.
pub fn remove_dir_all_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
