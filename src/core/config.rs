use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Browser identity sent with every outbound request (redirect lookups and yt-dlp).
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// Reads a numeric environment variable, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Ignoring invalid {}={:?}, using default", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_default()
});

/// Local Bot API server base URL, if one is used instead of api.telegram.org.
/// Read from BOT_API_URL environment variable
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| {
    env::var("BOT_API_URL")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
});

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Download folder path
/// Read from DOWNLOAD_FOLDER environment variable, supports tilde (~) expansion
/// Default: downloads (relative to the working directory)
pub static DOWNLOAD_FOLDER: Lazy<String> =
    Lazy::new(|| env::var("DOWNLOAD_FOLDER").unwrap_or_else(|_| "downloads".to_string()));

/// Maximum size of a relayed video in bytes.
/// Matches the Bot API upload limit for videos (50 MiB).
/// Read from MAX_FILE_SIZE_BYTES environment variable
pub static MAX_FILE_SIZE_BYTES: Lazy<u64> =
    Lazy::new(|| env_or("MAX_FILE_SIZE_BYTES", limits::DEFAULT_MAX_FILE_SIZE_BYTES));

/// Number of yt-dlp processes allowed to run at once.
/// Read from WORKER_POOL_SIZE environment variable
pub static WORKER_POOL_SIZE: Lazy<usize> =
    Lazy::new(|| env_or("WORKER_POOL_SIZE", limits::DEFAULT_WORKER_POOL_SIZE).max(1));

/// Cookies file passed to yt-dlp for Instagram (reels need a logged-in session).
/// Read from INSTAGRAM_COOKIES_FILE environment variable, empty value disables it
/// Default: instagram_cookies.txt
pub static INSTAGRAM_COOKIES_FILE: Lazy<Option<String>> = Lazy::new(|| {
    match env::var("INSTAGRAM_COOKIES_FILE") {
        Ok(value) if value.trim().is_empty() => None,
        Ok(value) => Some(value.trim().to_string()),
        Err(_) => Some("instagram_cookies.txt".to_string()),
    }
});

/// Size and concurrency limits
pub mod limits {
    /// 50 MiB
    pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

    pub const DEFAULT_WORKER_POOL_SIZE: usize = 4;
}

/// Download configuration
pub mod download {
    use super::Duration;

    /// Timeout for a single yt-dlp run (in seconds)
    pub const YTDLP_TIMEOUT_SECS: u64 = 240;

    /// Extra time the dispatcher waits for a worker after the yt-dlp timeout
    /// before giving up on it.
    pub const WORKER_GRACE_SECS: u64 = 30;

    /// yt-dlp command timeout duration
    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(super::env_or("DOWNLOAD_TIMEOUT_SECS", YTDLP_TIMEOUT_SECS))
    }

    pub fn worker_grace() -> Duration {
        Duration::from_secs(WORKER_GRACE_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Timeout for resolving a short link (in seconds)
    pub const REDIRECT_TIMEOUT_SECS: u64 = 10;

    /// Request timeout for Bot API calls (in seconds).
    /// Video uploads of up to 50 MB go through this client.
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;

    pub fn redirect_timeout() -> Duration {
        Duration::from_secs(super::env_or("REDIRECT_TIMEOUT_SECS", REDIRECT_TIMEOUT_SECS))
    }

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Shutdown configuration
pub mod shutdown {
    use super::Duration;

    /// How long to wait for in-flight relays after the dispatcher stops
    pub const DRAIN_TIMEOUT_SECS: u64 = 60;

    pub fn drain_timeout() -> Duration {
        Duration::from_secs(DRAIN_TIMEOUT_SECS)
    }
}

/// Runtime settings for the relay pipeline.
///
/// Built once from the environment in `main` and handed to every component
/// explicitly; tests construct it directly.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Largest file (in bytes) that is still relayed. Equal size is accepted.
    pub max_file_size: u64,
    /// Concurrent extraction slots.
    pub worker_pool_size: usize,
    pub download_timeout: Duration,
    pub redirect_timeout: Duration,
    pub download_dir: PathBuf,
    pub ytdl_bin: String,
    pub instagram_cookies_file: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_file_size: limits::DEFAULT_MAX_FILE_SIZE_BYTES,
            worker_pool_size: limits::DEFAULT_WORKER_POOL_SIZE,
            download_timeout: Duration::from_secs(download::YTDLP_TIMEOUT_SECS),
            redirect_timeout: Duration::from_secs(network::REDIRECT_TIMEOUT_SECS),
            download_dir: PathBuf::from("downloads"),
            ytdl_bin: "yt-dlp".to_string(),
            instagram_cookies_file: Some(PathBuf::from("instagram_cookies.txt")),
        }
    }
}

impl RelayConfig {
    /// Collects the environment-backed settings above.
    pub fn from_env() -> Self {
        Self {
            max_file_size: *MAX_FILE_SIZE_BYTES,
            worker_pool_size: *WORKER_POOL_SIZE,
            download_timeout: download::ytdlp_timeout(),
            redirect_timeout: network::redirect_timeout(),
            download_dir: PathBuf::from(shellexpand::tilde(DOWNLOAD_FOLDER.as_str()).into_owned()),
            ytdl_bin: YTDL_BIN.clone(),
            instagram_cookies_file: INSTAGRAM_COOKIES_FILE
                .as_ref()
                .map(|path| PathBuf::from(shellexpand::tilde(path).into_owned())),
        }
    }
}
