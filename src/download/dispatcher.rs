//! Bounded worker pool for blocking yt-dlp runs.
//!
//! Jobs wait (FIFO) for one of `pool_size` slots and then run on tokio's
//! blocking thread pool. The slot permit moves into the worker closure, so it
//! is only released when the extraction has actually finished: the number of
//! executing jobs never exceeds the pool size, even after a caller stopped
//! waiting.
//!
//! A job still waiting for a slot is cancelled by dropping the `dispatch`
//! future, or for all callers at once through the shutdown token.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::config::{self, RelayConfig, BROWSER_USER_AGENT};
use crate::core::utils::{host_matches, url_host};
use crate::download::error::DownloadError;
use crate::download::file::{cleanup_partial_files, LocalFile};
use crate::download::ytdlp::{DownloadJob, Extractor, Postprocessor, FORMAT_SELECTOR, OUTPUT_CONTAINER};

/// Hosts whose content needs a logged-in session
const COOKIE_HOSTS: &[&str] = &["instagram.com"];

pub struct DownloadDispatcher {
    extractor: Arc<dyn Extractor>,
    slots: Arc<Semaphore>,
    pool_size: usize,
    job_timeout: Duration,
    worker_grace: Duration,
    download_dir: PathBuf,
    cookie_file: Option<PathBuf>,
    shutdown: CancellationToken,
}

impl DownloadDispatcher {
    pub fn new(extractor: Arc<dyn Extractor>, config: &RelayConfig, shutdown: CancellationToken) -> Self {
        let pool_size = config.worker_pool_size.max(1);
        Self {
            extractor,
            slots: Arc::new(Semaphore::new(pool_size)),
            pool_size,
            job_timeout: config.download_timeout,
            worker_grace: config::download::worker_grace(),
            download_dir: config.download_dir.clone(),
            cookie_file: config.instagram_cookies_file.clone(),
            shutdown,
        }
    }

    /// Overrides how long the dispatcher waits past the job timeout for a worker.
    pub fn with_worker_grace(mut self, grace: Duration) -> Self {
        self.worker_grace = grace;
        self
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Number of jobs currently holding a slot.
    pub fn active_jobs(&self) -> usize {
        self.pool_size - self.slots.available_permits()
    }

    /// Describes how `url` should be downloaded.
    pub fn build_job(&self, url: &str) -> DownloadJob {
        let id = Uuid::new_v4();
        let output_template = self
            .download_dir
            .join(format!("{}_%(id)s.%(ext)s", id))
            .display()
            .to_string();

        DownloadJob {
            id,
            source_url: url.to_string(),
            cookie_file: self.cookie_file_for(url),
            download_dir: self.download_dir.clone(),
            output_template,
            format: FORMAT_SELECTOR,
            merge_format: OUTPUT_CONTAINER,
            postprocessors: vec![
                Postprocessor::ConvertVideo(OUTPUT_CONTAINER),
                Postprocessor::Metadata,
                Postprocessor::EmbedSubtitles,
            ],
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }

    fn cookie_file_for(&self, url: &str) -> Option<PathBuf> {
        let host = url_host(url)?;
        if !COOKIE_HOSTS.iter().any(|domain| host_matches(&host, domain)) {
            return None;
        }
        match &self.cookie_file {
            Some(path) if path.is_file() => Some(path.clone()),
            Some(path) => {
                log::warn!("Cookies file {} not found, downloading {} without it", path.display(), url);
                None
            }
            None => None,
        }
    }

    /// Runs the job on the worker pool and returns the produced file.
    pub async fn dispatch(&self, job: DownloadJob) -> Result<LocalFile, DownloadError> {
        let permit = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Err(DownloadError::Cancelled),
            permit = Arc::clone(&self.slots).acquire_owned() => {
                permit.map_err(|_| DownloadError::Cancelled)?
            }
        };

        let job_id = job.id;
        log::info!(
            "Job {} started for {} ({}/{} slots busy)",
            job_id,
            job.source_url,
            self.active_jobs(),
            self.pool_size
        );

        let extractor = Arc::clone(&self.extractor);
        let timeout = self.job_timeout;
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            run_job(extractor.as_ref(), &job, timeout)
        });

        // The guard is created on the worker, so if we stop waiting here the
        // file is still deleted when the worker finishes.
        match tokio::time::timeout(self.job_timeout + self.worker_grace, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(DownloadError::Process(format!("worker for job {} failed: {}", job_id, join_err))),
            Err(_) => {
                log::error!("Job {} did not finish within its timeout, abandoning it", job_id);
                Err(DownloadError::Timeout(self.job_timeout))
            }
        }
    }
}

fn run_job(extractor: &dyn Extractor, job: &DownloadJob, timeout: Duration) -> Result<LocalFile, DownloadError> {
    let result = extractor
        .extract(job, timeout)
        .and_then(|path| open_output(&path));

    if result.is_err() {
        cleanup_partial_files(&job.download_dir, &job.file_prefix());
    }
    result
}

fn open_output(path: &Path) -> Result<LocalFile, DownloadError> {
    LocalFile::open(path).map_err(|e| DownloadError::FileNotFound(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    struct NoopExtractor;

    impl Extractor for NoopExtractor {
        fn extract(&self, _job: &DownloadJob, _timeout: Duration) -> Result<PathBuf, DownloadError> {
            Err(DownloadError::YtDlp("not used".into()))
        }
    }

    fn dispatcher(config: &RelayConfig) -> DownloadDispatcher {
        DownloadDispatcher::new(Arc::new(NoopExtractor), config, CancellationToken::new())
    }

    #[test]
    fn test_build_job_policies() {
        let config = RelayConfig {
            download_dir: PathBuf::from("/srv/downloads"),
            instagram_cookies_file: None,
            ..RelayConfig::default()
        };
        let job = dispatcher(&config).build_job("https://www.tiktok.com/@user/video/1");

        assert_eq!(job.output_template, format!("/srv/downloads/{}_%(id)s.%(ext)s", job.id));
        assert_eq!(job.format, "bv*+ba/best");
        assert_eq!(job.merge_format, "mp4");
        assert_eq!(
            job.postprocessors,
            vec![
                Postprocessor::ConvertVideo("mp4"),
                Postprocessor::Metadata,
                Postprocessor::EmbedSubtitles
            ]
        );
        assert_eq!(job.user_agent, BROWSER_USER_AGENT);
        assert_eq!(job.cookie_file, None);
    }

    #[test]
    fn test_job_ids_are_unique() {
        let dispatcher = dispatcher(&RelayConfig::default());
        let a = dispatcher.build_job("https://youtube.com/shorts/abc");
        let b = dispatcher.build_job("https://youtube.com/shorts/abc");
        assert_ne!(a.id, b.id);
        assert_ne!(a.output_template, b.output_template);
    }

    #[test]
    fn test_cookies_attached_only_for_instagram() {
        let dir = tempdir().unwrap();
        let cookies = dir.path().join("instagram_cookies.txt");
        std::fs::write(&cookies, "# Netscape HTTP Cookie File\n").unwrap();
        let config = RelayConfig {
            instagram_cookies_file: Some(cookies.clone()),
            ..RelayConfig::default()
        };
        let dispatcher = dispatcher(&config);

        let reel = dispatcher.build_job("https://www.instagram.com/reel/C1abcDEF/");
        assert_eq!(reel.cookie_file, Some(cookies));

        let tiktok = dispatcher.build_job("https://www.tiktok.com/@user/video/1");
        assert_eq!(tiktok.cookie_file, None);

        let shorts = dispatcher.build_job("https://youtube.com/shorts/abc");
        assert_eq!(shorts.cookie_file, None);
    }

    #[test]
    fn test_missing_cookies_file_is_skipped() {
        let config = RelayConfig {
            instagram_cookies_file: Some(PathBuf::from("/definitely/missing/cookies.txt")),
            ..RelayConfig::default()
        };
        let job = dispatcher(&config).build_job("https://www.instagram.com/reel/C1abcDEF/");
        assert_eq!(job.cookie_file, None);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_queued_job() {
        let shutdown = CancellationToken::new();
        let config = RelayConfig::default();
        let dispatcher = DownloadDispatcher::new(Arc::new(NoopExtractor), &config, shutdown.clone());
        shutdown.cancel();

        let job = dispatcher.build_job("https://youtube.com/shorts/abc");
        let result = dispatcher.dispatch(job).await;
        assert!(matches!(result, Err(DownloadError::Cancelled)));
        assert_eq!(dispatcher.active_jobs(), 0);
    }

    #[test]
    fn test_zero_pool_size_is_clamped() {
        let config = RelayConfig {
            worker_pool_size: 0,
            ..RelayConfig::default()
        };
        assert_eq!(dispatcher(&config).pool_size(), 1);
    }
}
