//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup diagnostics for the relay configuration and the cookies file

use anyhow::Result;
use simplelog::*;
use std::path::Path;

use crate::core::config::RelayConfig;
use crate::core::utils::format_megabytes;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the log file or a logger was already set
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file =
        fs_err::File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// State of the configured cookies file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookiesStatus {
    NotConfigured,
    Missing(String),
    Present(String),
}

/// Checks whether the Instagram cookies file is usable.
pub fn cookies_status(config: &RelayConfig) -> CookiesStatus {
    match &config.instagram_cookies_file {
        None => CookiesStatus::NotConfigured,
        Some(path) if Path::new(path).is_file() => {
            let shown = path.canonicalize().unwrap_or_else(|_| path.clone());
            CookiesStatus::Present(shown.display().to_string())
        }
        Some(path) => CookiesStatus::Missing(path.display().to_string()),
    }
}

/// Logs the relay configuration at application startup.
pub fn log_startup_configuration(config: &RelayConfig) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🎬 Relay configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("   yt-dlp binary:    {}", config.ytdl_bin);
    log::info!("   Download folder:  {}", config.download_dir.display());
    log::info!("   Worker slots:     {}", config.worker_pool_size);
    log::info!(
        "   Size ceiling:     {} bytes ({} MB)",
        config.max_file_size,
        format_megabytes(config.max_file_size)
    );
    log::info!("   Download timeout: {}s", config.download_timeout.as_secs());
    log::info!("   Redirect timeout: {}s", config.redirect_timeout.as_secs());

    match cookies_status(config) {
        CookiesStatus::Present(path) => {
            log::info!("✅ INSTAGRAM_COOKIES_FILE: {}", path);
        }
        CookiesStatus::Missing(path) => {
            log::warn!("⚠️  INSTAGRAM_COOKIES_FILE: {} (FILE NOT FOUND)", path);
            log::warn!("   Instagram reels will be fetched without a session and may fail");
        }
        CookiesStatus::NotConfigured => {
            log::warn!("⚠️  INSTAGRAM_COOKIES_FILE: disabled");
        }
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cookies_status_not_configured() {
        let config = RelayConfig {
            instagram_cookies_file: None,
            ..RelayConfig::default()
        };
        assert_eq!(cookies_status(&config), CookiesStatus::NotConfigured);
    }

    #[test]
    fn test_cookies_status_missing_file() {
        let config = RelayConfig {
            instagram_cookies_file: Some(PathBuf::from("/definitely/not/here/cookies.txt")),
            ..RelayConfig::default()
        };
        assert!(matches!(cookies_status(&config), CookiesStatus::Missing(_)));
    }

    #[test]
    fn test_cookies_status_present_file() {
        let file = NamedTempFile::new().unwrap();
        let config = RelayConfig {
            instagram_cookies_file: Some(file.path().to_path_buf()),
            ..RelayConfig::default()
        };
        assert!(matches!(cookies_status(&config), CookiesStatus::Present(_)));
    }
}
