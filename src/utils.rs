use crate::PoolError;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let millis = duration.subsec_millis();

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else if seconds > 0 {
        format!("{}.{}s", seconds, millis / 100)
    } else {
        format!("{millis}ms")
    }
}

/// Parses `url`, accepting only http and https.
pub fn validate_url(url: &str) -> Result<Url, PoolError> {
    let parsed = Url::parse(url).map_err(|e| PoolError::Task(format!("invalid URL {url:?}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(PoolError::Task(format!(
            "unsupported scheme {scheme:?} in {url}"
        ))),
    }
}

/// One URL per line; blank lines and `#` comments are skipped.
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
        .collect()
}

pub async fn read_url_list(path: &Path) -> Result<Vec<String>, PoolError> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(parse_url_list(&content))
}
