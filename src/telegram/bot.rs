//! Bot instance creation

use reqwest::ClientBuilder;
use teloxide::Bot;

use crate::core::config;
use crate::core::error::AppError;

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(AppError)` - Missing token, invalid BOT_API_URL, or HTTP client failure
pub fn create_bot() -> Result<Bot, AppError> {
    let token = config::BOT_TOKEN.as_str();
    if token.is_empty() {
        return Err(AppError::Config("BOT_TOKEN (or TELOXIDE_TOKEN) is not set".to_string()));
    }

    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(token, client);

    // Local Bot API server, if configured
    match config::BOT_API_URL.as_deref() {
        Some(raw) => {
            let url = parse_bot_api_url(raw)?;
            log::info!("Using custom Bot API URL: {}", url);
            Ok(bot.set_api_url(url))
        }
        None => Ok(bot),
    }
}

/// Validates a `BOT_API_URL` value.
pub fn parse_bot_api_url(raw: &str) -> Result<url::Url, AppError> {
    let url = url::Url::parse(raw)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Config(format!("BOT_API_URL must be http(s), got {}", raw)));
    }
    Ok(url)
}
