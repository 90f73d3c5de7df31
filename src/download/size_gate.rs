use crate::core::utils::format_megabytes;
use crate::download::file::LocalFile;

/// A downloaded file that was over the ceiling. The file is already gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oversize {
    pub size_bytes: u64,
    pub max_bytes: u64,
}

impl Oversize {
    /// Reply shown in the chat.
    pub fn user_message(&self) -> String {
        format!(
            "⚠️ Файл занадто потужний для завантаження (приблизно {} МБ). Максимальний розмір: {} МБ.",
            format_megabytes(self.size_bytes),
            format_megabytes(self.max_bytes).trim_end_matches(".00")
        )
    }
}

/// Passes files of at most `max_bytes` through; deletes anything larger
/// before returning the error.
pub fn enforce(file: LocalFile, max_bytes: u64) -> Result<LocalFile, Oversize> {
    let size_bytes = file.size_bytes();
    if size_bytes <= max_bytes {
        return Ok(file);
    }

    log::warn!(
        "{} is {} bytes, over the {} byte ceiling; deleting",
        file.path().display(),
        size_bytes,
        max_bytes
    );
    let path = file.path().to_path_buf();
    if let Err(e) = file.remove() {
        log::error!("Failed to delete oversize file {}: {}", path.display(), e);
    }
    Err(Oversize { size_bytes, max_bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    const CEILING: u64 = 50 * 1024 * 1024;

    fn sparse_file(dir: &Path, len: u64) -> PathBuf {
        let path = dir.join("video.mp4");
        std::fs::File::create(&path).unwrap().set_len(len).unwrap();
        path
    }

    #[test]
    fn test_exactly_at_ceiling_is_accepted() {
        let dir = tempdir().unwrap();
        let path = sparse_file(dir.path(), CEILING);

        let file = enforce(LocalFile::open(&path).unwrap(), CEILING).unwrap();
        assert!(path.exists());
        assert_eq!(file.size_bytes(), CEILING);
    }

    #[test]
    fn test_one_byte_over_is_rejected_and_deleted() {
        let dir = tempdir().unwrap();
        let path = sparse_file(dir.path(), CEILING + 1);

        let err = enforce(LocalFile::open(&path).unwrap(), CEILING).unwrap_err();
        assert_eq!(
            err,
            Oversize {
                size_bytes: CEILING + 1,
                max_bytes: CEILING
            }
        );
        assert!(!path.exists());
    }

    #[test]
    fn test_user_message_shows_measured_size() {
        let err = Oversize {
            size_bytes: 60 * 1024 * 1024,
            max_bytes: CEILING,
        };
        let message = err.user_message();
        assert!(message.contains("60.00 МБ"));
        assert!(message.contains("Максимальний розмір: 50 МБ"));
    }
}
