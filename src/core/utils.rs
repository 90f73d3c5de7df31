/// Formats a byte count as mebibytes with two decimals.
///
/// # Example
///
/// ```
/// use reel_relay::core::utils::format_megabytes;
///
/// assert_eq!(format_megabytes(60 * 1024 * 1024), "60.00");
/// assert_eq!(format_megabytes(1_572_864), "1.50");
/// ```
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / (1024.0 * 1024.0))
}

/// Caption attached to every relayed video.
pub fn format_relay_caption(sender_display_name: &str) -> String {
    format!("Потужно надіслав: 👤{}", sender_display_name)
}

/// Extracts the lowercase host of a URL string, if it parses.
pub fn url_host(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| host.to_lowercase()))
}

/// True when `host` is `domain` itself or one of its subdomains.
pub fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}
