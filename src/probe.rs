//! Minimal page visit used to exercise the pool end to end.

use crate::utils::validate_url;
use crate::{BrowserInstance, PoolError};
use chrono::{DateTime, Utc};
use chromiumoxide::Page;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// What a single visit observed.
#[derive(Debug, Clone, Serialize)]
pub struct PageSnapshot {
    pub url: String,
    pub final_url: Option<String>,
    pub title: Option<String>,
    pub html_bytes: usize,
    pub duration_ms: u64,
    pub captured_at: DateTime<Utc>,
    pub browser: String,
}

/// Opens `url` in a fresh tab, waits for it to load and records a summary.
///
/// The tab is closed before returning, whether or not the visit succeeded.
pub async fn probe_page(
    instance: &BrowserInstance,
    url: &str,
    deadline: Duration,
) -> Result<PageSnapshot, PoolError> {
    let target = validate_url(url)?;
    let started = Instant::now();

    let page = instance
        .browser()
        .new_page(target.as_str())
        .await
        .map_err(|e| PoolError::Task(format!("failed to open {url}: {e}")))?;

    let outcome = match timeout(deadline, inspect(&page)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(PoolError::Task(format!(
            "{url} did not load within {deadline:?}"
        ))),
    };

    if let Err(e) = page.close().await {
        debug!("Failed to close tab for {}: {}", url, e);
    }

    let (final_url, title, html_bytes) = outcome?;
    Ok(PageSnapshot {
        url: url.to_string(),
        final_url,
        title,
        html_bytes,
        duration_ms: started.elapsed().as_millis() as u64,
        captured_at: Utc::now(),
        browser: instance.tag().to_string(),
    })
}

async fn inspect(page: &Page) -> Result<(Option<String>, Option<String>, usize), PoolError> {
    page.wait_for_navigation()
        .await
        .map_err(|e| PoolError::Task(e.to_string()))?;

    let title = or_logged("title", page.get_title().await);
    let final_url = or_logged("final URL", page.url().await);
    let html = page
        .content()
        .await
        .map_err(|e| PoolError::Task(e.to_string()))?;

    Ok((final_url, title, html.len()))
}

/// Optional page details degrade to `None`, but the reason is kept in the log.
pub(crate) fn or_logged<T, E: std::fmt::Display>(what: &str, read: Result<Option<T>, E>) -> Option<T> {
    match read {
        Ok(value) => value,
        Err(e) => {
            debug!("Could not read {}: {}", what, e);
            None
        }
    }
}
