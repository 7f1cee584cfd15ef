//! # Audit Browser Pool
//!
//! A bounded, concurrency-safe pool of headless Chrome instances shared by
//! many concurrent page audits. Launching Chrome takes seconds, so the pool
//! keeps a small set of browsers alive, lends each one to exactly one task
//! at a time and reclaims long-idle capacity in the background.
//!
//! ## Lifecycle of a pooled browser
//!
//! | State | Entered by | Left by |
//! |-------|------------|---------|
//! | **Creating** | `acquire()` below `max`, warm-up, top-up to `min` | launch success or failure |
//! | **Available** | launch, `release()` with no waiter queued | `acquire()`, eviction, drain |
//! | **Borrowed** | `acquire()`, direct hand-off on release | `release()` or drop |
//! | **Destroyed** | failed validation or cleanup, idle eviction, drain | never |
//!
//! ## Guarantees
//!
//! - A resource is never lent to two callers at once.
//! - `size` never exceeds `max`, counting launches still in flight.
//! - Waiters are served strictly first-in first-out, with a freed browser
//!   handed straight to the oldest one.
//! - `acquire()` fails with [`PoolError::AcquisitionTimeout`] instead of
//!   queuing forever, and a timeout never cancels a launch in progress.
//! - [`Pool::execute`] releases the browser on every exit path.
//! - [`Pool::drain`] leaves nothing running.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use audit_browser_pool::{probe_page, BrowserFactory, BrowserSettings, Pool, PoolConfig, PoolError};
//! use futures::FutureExt;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), PoolError> {
//!     let pool = Pool::new(BrowserFactory::new(BrowserSettings::default()), PoolConfig::default())?;
//!
//!     let snapshot = pool
//!         .execute(|browser| {
//!             async move { probe_page(browser, "https://example.com", Duration::from_secs(30)).await }
//!                 .boxed()
//!         })
//!         .await?;
//!     println!("{:?}", snapshot.title);
//!
//!     pool.drain().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Benchmarks
//! ```bash
//! # Pool bookkeeping only, no Chrome required
//! cargo bench
//!
//! # Including real Chrome launches
//! cargo bench --features integration_benchmarks
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! audit-browser-pool probe --url https://example.com
//! audit-browser-pool --max 8 batch --input urls.txt --concurrency 16 --output results.json
//! ```

/// Pool sizing, Chrome launch settings and the binary's config file
pub mod config;

/// Error types and error handling utilities
pub mod error;

/// The create/destroy/validate contract behind every pool
pub mod factory;

/// Acquire, release and scoped execution
pub mod pool;

/// Background reclamation of idle resources
mod eviction;

/// Graceful shutdown
mod drain;

/// Stats snapshots and exported metrics
pub mod metrics;

/// Health classification of a pool's stats
pub mod health;

/// Headless Chrome factory
pub mod browser;

/// Single page visit run through the pool
pub mod probe;

/// Command-line interface implementation
pub mod cli;

/// Utility functions and helpers
pub mod utils;


pub use browser::*;
pub use cli::*;
pub use config::*;
pub use error::*;
pub use factory::*;
pub use health::*;
pub use self::metrics::*;
pub use pool::*;
pub use probe::*;
pub use utils::*;
