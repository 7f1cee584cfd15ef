use crate::utils::{format_duration, read_url_list};
use crate::{
    assess, monitor, probe_page, AppConfig, BrowserFactory, HealthThresholds, PageSnapshot,
    Pool, PoolError,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::{FutureExt, StreamExt};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "audit-browser-pool")]
#[command(about = "Pooled headless Chrome for page audits")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Configuration file path (JSON)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Minimum number of browsers kept alive")]
    pub min: Option<usize>,

    #[arg(long, global = true, help = "Maximum number of browsers")]
    pub max: Option<usize>,

    #[arg(long, global = true, help = "Acquire timeout in milliseconds")]
    pub acquire_timeout_ms: Option<u64>,

    #[arg(long, global = true, help = "Chrome executable path")]
    pub chrome_path: Option<String>,

    #[arg(long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Expose Prometheus metrics on this port")]
    pub metrics_port: Option<u16>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Visit a single page
    Probe {
        #[arg(short, long, help = "URL to visit")]
        url: String,

        #[arg(long, default_value = "30000", help = "Page load timeout in milliseconds")]
        page_timeout_ms: u64,
    },

    /// Visit every URL listed in a file
    Batch {
        #[arg(short, long, help = "Input file containing URLs (one per line)")]
        input: PathBuf,

        #[arg(short, long, help = "Concurrency level (default: CPU count)")]
        concurrency: Option<usize>,

        #[arg(short, long, help = "Write results as JSON to this file")]
        output: Option<PathBuf>,

        #[arg(long, default_value = "30000", help = "Page load timeout in milliseconds")]
        page_timeout_ms: u64,
    },

    /// Validate configuration
    Validate {
        #[arg(short, long, help = "Configuration file to validate")]
        file: PathBuf,
    },

    /// Print the effective configuration as JSON
    PrintConfig,
}

impl Commands {
    /// Whether the command drives browsers, i.e. needs a running pool.
    pub fn needs_pool(&self) -> bool {
        matches!(self, Commands::Probe { .. } | Commands::Batch { .. })
    }
}

/// Loads the configuration file, if any, and applies command-line overrides.
pub async fn load_config(args: &Cli) -> Result<AppConfig, PoolError> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path).await?,
        None => AppConfig::default(),
    };

    if let Some(min) = args.min {
        config.pool.min = min;
    }
    if let Some(max) = args.max {
        config.pool.max = max;
    }
    if let Some(timeout) = args.acquire_timeout_ms {
        config.pool.acquire_timeout = Duration::from_millis(timeout);
    }
    if let Some(chrome_path) = &args.chrome_path {
        config.browser.chrome_path = Some(chrome_path.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Runs the configuration-only commands that need no browser.
pub async fn run_offline(config: &AppConfig, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Validate { file: path } => {
            println!("Validating configuration: {}", path.display());
            let checked = AppConfig::load(&path).await?;

            println!("Configuration is valid:");
            println!("  Pool: min {} / max {}", checked.pool.min, checked.pool.max);
            println!("  Acquire timeout: {:?}", checked.pool.acquire_timeout);
            println!("  Idle timeout: {:?}", checked.pool.idle_timeout);
            println!("  Eviction interval: {:?}", checked.pool.eviction_interval);
            println!(
                "  Viewport: {}x{}",
                checked.browser.viewport.width, checked.browser.viewport.height
            );
            Ok(())
        }
        Commands::PrintConfig => {
            println!("{}", serde_json::to_string_pretty(config)?);
            Ok(())
        }
        Commands::Probe { .. } | Commands::Batch { .. } => {
            anyhow::bail!("this command needs a browser pool")
        }
    }
}

pub struct CliRunner {
    pub config: AppConfig,
    pub pool: Pool<BrowserFactory>,
}

impl CliRunner {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let factory = BrowserFactory::new(config.browser.clone());
        let pool = Pool::new(factory, config.pool.clone())?;

        if let Err(e) = pool.warm_up().await {
            // Not fatal: acquire() creates on demand.
            warn!("Warm-up incomplete: {}", e);
        }

        Ok(Self { config, pool })
    }

    pub async fn run(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Probe {
                url,
                page_timeout_ms,
            } => {
                self.run_probe(url, Duration::from_millis(page_timeout_ms))
                    .await
            }
            Commands::Batch {
                input,
                concurrency,
                output,
                page_timeout_ms,
            } => {
                let concurrency = concurrency.unwrap_or_else(num_cpus::get).max(1);
                self.run_batch(
                    input,
                    concurrency,
                    output,
                    Duration::from_millis(page_timeout_ms),
                )
                .await
            }
            other => run_offline(&self.config, other).await,
        }
    }

    pub async fn run_probe(&self, url: String, page_timeout: Duration) -> anyhow::Result<()> {
        info!("Probing: {}", url);

        let snapshot = self.visit(url, page_timeout).await?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);

        Ok(())
    }

    pub async fn run_batch(
        &self,
        input: PathBuf,
        concurrency: usize,
        output: Option<PathBuf>,
        page_timeout: Duration,
    ) -> anyhow::Result<()> {
        let urls = read_url_list(&input)
            .await
            .with_context(|| format!("failed to read {}", input.display()))?;
        info!(
            "Loaded {} URLs from {}, running {} at a time",
            urls.len(),
            input.display(),
            concurrency
        );

        let health = monitor(
            self.pool.clone(),
            HealthThresholds::default(),
            Duration::from_secs(10),
        );
        let started = Instant::now();
        let total = urls.len();
        let mut snapshots = Vec::with_capacity(total);
        let mut error_count = 0;

        let mut visits = futures::stream::iter(urls)
            .map(|url| async move {
                let result = self.visit(url.clone(), page_timeout).await;
                (url, result)
            })
            .buffer_unordered(concurrency);

        while let Some((url, result)) = visits.next().await {
            match result {
                Ok(snapshot) => {
                    info!(
                        "[{}/{}] {} ({} ms)",
                        snapshots.len() + error_count + 1,
                        total,
                        url,
                        snapshot.duration_ms
                    );
                    snapshots.push(snapshot);
                }
                Err(e) => {
                    error_count += 1;
                    warn!("Failed to probe {}: {}", url, e);
                }
            }
        }

        if let Some(path) = output {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&path, serde_json::to_vec_pretty(&snapshots)?).await?;
            info!("Results written to {}", path.display());
        }

        health.abort();
        let report = assess(&self.pool.stats(), &HealthThresholds::default());
        report.log();

        info!(
            "Batch completed in {}. Success: {}, Errors: {}",
            format_duration(started.elapsed()),
            snapshots.len(),
            error_count
        );

        if error_count > 0 && snapshots.is_empty() {
            error!("Every page in the batch failed");
            anyhow::bail!("all {} pages failed", error_count);
        }
        Ok(())
    }

    async fn visit(&self, url: String, page_timeout: Duration) -> Result<PageSnapshot, PoolError> {
        self.pool
            .execute(move |instance| {
                async move { probe_page(instance, &url, page_timeout).await }.boxed()
            })
            .await
    }

    /// Drains the pool; every browser is closed when this returns.
    pub async fn shutdown(&self) {
        self.pool.drain().await;
    }
}

pub fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    Ok(())
}
