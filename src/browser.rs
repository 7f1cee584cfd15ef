//! Headless Chrome as a pooled resource
//!
//! [`BrowserFactory`] launches one Chrome process per pooled resource, each
//! with its own profile directory and its own task pumping the Chrome
//! DevTools Protocol connection.

use crate::{BrowserSettings, Factory};
use anyhow::Context;
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One running Chrome process owned by the pool.
pub struct BrowserInstance {
    tag: String,
    browser: Browser,
    /// Background task handling Chrome DevTools Protocol communication
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
    launched_at: Instant,
}

impl BrowserInstance {
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    pub fn browser_mut(&mut self) -> &mut Browser {
        &mut self.browser
    }

    /// Launch tag used in this instance's profile and temp directory names
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn age(&self) -> Duration {
        self.launched_at.elapsed()
    }

    /// False once the CDP connection has ended, i.e. Chrome went away.
    pub fn is_connected(&self) -> bool {
        !self.handler.is_finished()
    }
}

/// [`Factory`] launching headless Chrome through chromiumoxide.
pub struct BrowserFactory {
    settings: BrowserSettings,
    launches: AtomicUsize,
}

impl BrowserFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            launches: AtomicUsize::new(0),
        }
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }
}

#[async_trait]
impl Factory for BrowserFactory {
    type Resource = BrowserInstance;

    async fn create(&self) -> anyhow::Result<BrowserInstance> {
        let tag = self.launches.fetch_add(1, Ordering::Relaxed).to_string();
        let profile_dir = self.settings.profile_dir(&tag);

        tokio::fs::create_dir_all(profile_dir.join("tmp"))
            .await
            .with_context(|| format!("failed to create profile dir {}", profile_dir.display()))?;

        let config = self.settings.browser_config(&tag)?;
        let launched_at = Instant::now();
        let (browser, mut handler) = Browser::launch(config)
            .await
            .with_context(|| format!("failed to launch Chrome instance {tag}"))?;

        // The handler is a Stream and must be polled for the browser to make progress
        let handler_tag = tag.clone();
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("Chrome instance {} handler error: {}", handler_tag, e);
                    break;
                }
            }
            debug!("Chrome instance {} handler stream ended", handler_tag);
        });

        info!(
            "Chrome instance {} launched in {:?}",
            tag,
            launched_at.elapsed()
        );

        Ok(BrowserInstance {
            tag,
            browser,
            handler,
            profile_dir,
            launched_at,
        })
    }

    async fn destroy(&self, mut instance: BrowserInstance) -> anyhow::Result<()> {
        let closed = instance.browser.close().await;
        if closed.is_err() {
            if let Some(Err(e)) = instance.browser.kill().await {
                warn!("Failed to kill Chrome instance {}: {}", instance.tag, e);
            }
        }

        if tokio::time::timeout(self.settings.probe_timeout, instance.browser.wait())
            .await
            .is_err()
        {
            warn!("Chrome instance {} did not exit in time", instance.tag);
        }
        instance.handler.abort();

        if let Err(e) = tokio::fs::remove_dir_all(&instance.profile_dir).await {
            debug!(
                "Could not remove profile dir {}: {}",
                instance.profile_dir.display(),
                e
            );
        }

        closed
            .map(|_| ())
            .with_context(|| format!("Chrome instance {} did not close cleanly", instance.tag))
    }

    async fn validate(&self, instance: &BrowserInstance) -> bool {
        if !instance.is_connected() {
            debug!("Chrome instance {} lost its CDP connection", instance.tag);
            return false;
        }

        match tokio::time::timeout(self.settings.probe_timeout, instance.browser.version()).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("Chrome instance {} version probe failed: {}", instance.tag, e);
                false
            }
            Err(_) => {
                debug!("Chrome instance {} version probe timed out", instance.tag);
                false
            }
        }
    }

    async fn cleanup(&self, instance: &mut BrowserInstance) -> anyhow::Result<()> {
        let pages = instance
            .browser
            .pages()
            .await
            .context("failed to list open pages")?;

        for page in pages {
            page.close().await.context("failed to close page")?;
        }

        Ok(())
    }
}
