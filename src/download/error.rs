use std::time::Duration;
use thiserror::Error;

/// Structured error type for download operations.
///
/// Every variant ends the request with a single "could not download" reply;
/// the variants exist for logs.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// yt-dlp exited with an error (unsupported URL, private video, network failure inside the tool)
    #[error("yt-dlp failed: {0}")]
    YtDlp(String),
    /// yt-dlp reported success but the file is not where it said
    #[error("downloaded file not found: {0}")]
    FileNotFound(String),
    /// The job ran longer than the configured timeout and was killed
    #[error("download timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// Spawning yt-dlp or joining the worker failed
    #[error("process error: {0}")]
    Process(String),
    /// The job was dropped from the queue before it started (shutdown)
    #[error("download cancelled before it started")]
    Cancelled,
}

impl DownloadError {
    /// Returns subcategory for logs
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::YtDlp(_) => "ytdlp",
            DownloadError::FileNotFound(_) => "file_not_found",
            DownloadError::Timeout(_) => "timeout",
            DownloadError::Process(_) => "process",
            DownloadError::Cancelled => "cancelled",
        }
    }
}
