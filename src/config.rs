//! Configuration management with serde serialization/deserialization
//!
//! This module holds the pool sizing and timing options, the Chrome launch
//! settings used by the browser factory, and the top-level [`AppConfig`]
//! the binary reads from disk.

use crate::PoolError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sizing and timing rules for a [`Pool`](crate::Pool).
///
/// Set once at construction and never mutated afterwards. On disk the
/// option names are camelCase and every duration is an integer number of
/// milliseconds.
///
/// # Examples
///
/// ```rust
/// use audit_browser_pool::PoolConfig;
/// use std::time::Duration;
///
/// let config = PoolConfig {
///     min: 2,
///     max: 8,
///     acquire_timeout: Duration::from_secs(10),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Floor capacity kept alive by the eviction scheduler (default: 1)
    pub min: usize,

    /// Ceiling capacity, counting resources still being created (default: 5)
    pub max: usize,

    /// Longest an `acquire()` may take before failing (default: 30 seconds)
    #[serde(rename = "acquireTimeoutMillis", with = "millis")]
    pub acquire_timeout: Duration,

    /// Idle time after which an available resource becomes evictable (default: 30 seconds)
    #[serde(rename = "idleTimeoutMillis", with = "millis")]
    pub idle_timeout: Duration,

    /// Period of the eviction sweep (default: 10 seconds)
    #[serde(rename = "evictionRunIntervalMillis", with = "millis")]
    pub eviction_interval: Duration,

    /// Validate a pooled resource before lending it out (default: true)
    #[serde(rename = "testOnBorrow")]
    pub test_on_borrow: bool,

    /// Probe surviving idle resources during each eviction sweep (default: false)
    #[serde(rename = "testWhileIdle")]
    pub test_while_idle: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min: 1,
            max: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(30),
            eviction_interval: Duration::from_secs(10),
            test_on_borrow: true,
            test_while_idle: false,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max == 0 {
            return Err(PoolError::Configuration(
                "max must be greater than 0".to_string(),
            ));
        }

        if self.min > self.max {
            return Err(PoolError::Configuration(format!(
                "min ({}) must not exceed max ({})",
                self.min, self.max
            )));
        }

        if self.acquire_timeout.is_zero() {
            return Err(PoolError::Configuration(
                "acquireTimeoutMillis must be greater than 0".to_string(),
            ));
        }

        if self.eviction_interval.is_zero() {
            return Err(PoolError::Configuration(
                "evictionRunIntervalMillis must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Browser viewport used for every pooled Chrome instance
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Viewport {
    /// Viewport width in pixels (default: 1366)
    pub width: u32,

    /// Viewport height in pixels (default: 768)
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1366,
            height: 768,
        }
    }
}

/// Chrome launch settings for [`BrowserFactory`](crate::BrowserFactory)
///
/// # Examples
///
/// ```rust
/// use audit_browser_pool::BrowserSettings;
///
/// let settings = BrowserSettings {
///     enable_javascript: false,
///     ..Default::default()
/// };
/// assert!(settings.chrome_args("0").contains(&"--disable-javascript".to_string()));
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Path to Chrome/Chromium executable (default: auto-detect)
    pub chrome_path: Option<String>,

    pub viewport: Viewport,

    /// Custom User-Agent string (default: Chrome default)
    pub user_agent: Option<String>,

    /// V8 heap ceiling per instance in bytes (default: 1GB)
    pub memory_limit: Option<usize>,

    /// Skip image loading (default: false)
    pub block_images: bool,

    /// Execute page JavaScript (default: true)
    ///
    /// Most audits need a rendered DOM, so this should stay on unless the
    /// consumers only read static markup.
    pub enable_javascript: bool,

    /// Disable browser plugins (default: true)
    pub disable_plugins: bool,

    /// Upper bound on a Chrome launch (default: 20 seconds)
    #[serde(with = "millis")]
    pub launch_timeout: Duration,

    /// Deadline for the liveness probe run by `validate` (default: 2 seconds)
    #[serde(with = "millis")]
    pub probe_timeout: Duration,

    /// Directory under which per-instance profiles are created (default: system temp dir)
    pub profile_root: PathBuf,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            viewport: Viewport::default(),
            user_agent: None,
            memory_limit: Some(1024 * 1024 * 1024), // 1GB
            block_images: false,
            enable_javascript: true,
            disable_plugins: true,
            launch_timeout: Duration::from_secs(20),
            probe_timeout: Duration::from_secs(2),
            profile_root: std::env::temp_dir(),
        }
    }
}

impl BrowserSettings {
    /// Profile directory for one browser instance
    pub fn profile_dir(&self, instance_tag: &str) -> PathBuf {
        self.profile_root
            .join(format!("audit-browser-{}-{}", std::process::id(), instance_tag))
    }

    /// Chrome command-line arguments for one pooled instance
    ///
    /// Each instance gets its own temp directory so concurrent launches do
    /// not trip over Chrome's process-singleton lock.
    pub fn chrome_args(&self, instance_tag: &str) -> Vec<String> {
        let mut args = vec![
            "--headless".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--disable-background-timer-throttling".to_string(),
            "--disable-backgrounding-occluded-windows".to_string(),
            "--disable-renderer-backgrounding".to_string(),
            "--disable-features=TranslateUI,ProcessSingleton".to_string(),
            "--disable-extensions".to_string(),
            "--disable-default-apps".to_string(),
            "--disable-sync".to_string(),
            "--no-first-run".to_string(),
            "--disable-process-singleton-dialog".to_string(),
            "--ignore-certificate-errors".to_string(),
            format!(
                "--window-size={},{}",
                self.viewport.width, self.viewport.height
            ),
            format!(
                "--temp-dir={}",
                self.profile_dir(instance_tag).join("tmp").display()
            ),
        ];

        if let Some(memory_limit) = self.memory_limit {
            args.push(format!(
                "--js-flags=--max-old-space-size={}",
                memory_limit / 1024 / 1024
            ));
        }

        if self.block_images {
            args.push("--blink-settings=imagesEnabled=false".to_string());
        }

        if !self.enable_javascript {
            args.push("--disable-javascript".to_string());
        }

        if self.disable_plugins {
            args.push("--disable-plugins".to_string());
        }

        if let Some(user_agent) = &self.user_agent {
            args.push(format!("--user-agent={user_agent}"));
        }

        args
    }

    pub fn browser_config(
        &self,
        instance_tag: &str,
    ) -> Result<chromiumoxide::browser::BrowserConfig, PoolError> {
        use chromiumoxide::browser::BrowserConfig;

        let mut builder = BrowserConfig::builder()
            .window_size(self.viewport.width, self.viewport.height)
            .user_data_dir(self.profile_dir(instance_tag))
            .launch_timeout(self.launch_timeout)
            .args(self.chrome_args(instance_tag));

        if let Some(chrome_path) = &self.chrome_path {
            builder = builder.chrome_executable(chrome_path);
        }

        builder.build().map_err(PoolError::Configuration)
    }
}

/// Everything the binary reads from its configuration file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub pool: PoolConfig,
    pub browser: BrowserSettings,
}

impl AppConfig {
    pub async fn load(path: &Path) -> Result<Self, PoolError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PoolError::Configuration(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, PoolError> {
        let config: AppConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        self.pool.validate()?;

        if self.browser.viewport.width == 0 || self.browser.viewport.height == 0 {
            return Err(PoolError::Configuration(
                "Viewport dimensions must be greater than 0".to_string(),
            ));
        }

        if self.browser.probe_timeout.is_zero() {
            return Err(PoolError::Configuration(
                "probe_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
