//! Ownership guard for downloaded files.
//!
//! A `LocalFile` is owned by exactly one request. It is deleted either
//! explicitly with [`LocalFile::remove`] or, on any other exit path, when the
//! guard is dropped. Either way the delete happens once.

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct LocalFile {
    path: PathBuf,
    size_bytes: u64,
    removed: bool,
}

impl LocalFile {
    /// Takes ownership of an existing regular file and records its size.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let metadata = fs_err::metadata(&path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        Ok(Self {
            path,
            size_bytes: metadata.len(),
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Gives up ownership without deleting (CLI `fetch --keep`).
    pub fn keep(mut self) -> PathBuf {
        self.removed = true;
        std::mem::take(&mut self.path)
    }

    /// Deletes the file now. An already missing file counts as deleted.
    pub fn remove(mut self) -> io::Result<()> {
        self.removed = true;
        remove_quietly(&self.path)
    }
}

impl Drop for LocalFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = remove_quietly(&self.path) {
            log::warn!("Failed to clean up {}: {}", self.path.display(), e);
        } else {
            log::debug!("Cleaned up {}", self.path.display());
        }
    }
}

fn remove_quietly(path: &Path) -> io::Result<()> {
    match fs_err::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Creates the download directory if absent and returns its absolute path.
pub fn prepare_download_dir(dir: &Path) -> io::Result<PathBuf> {
    fs_err::create_dir_all(dir)?;
    fs_err::canonicalize(dir)
}

/// Removes leftovers (`.part`, `.ytdl`, unmerged streams) of a job whose
/// output files start with `prefix`. Returns how many files were removed.
pub fn cleanup_partial_files(dir: &Path, prefix: &str) -> usize {
    let entries = match fs_err::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot scan {} for partial downloads: {}", dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(prefix) {
            continue;
        }
        match remove_quietly(&entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => log::warn!("Failed to remove partial file {}: {}", entry.path().display(), e),
        }
    }
    if removed > 0 {
        log::info!("Removed {} partial file(s) for job {}", removed, prefix);
    }
    removed
}
