use audit_browser_pool::{
    install_prometheus_exporter, load_config, run_offline, setup_logging, Cli, CliRunner,
};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    setup_logging(args.verbose)?;

    info!("Starting audit-browser-pool v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args).await?;
    info!(
        "Pool sizing: min {}, max {}, acquire timeout {:?}",
        config.pool.min, config.pool.max, config.pool.acquire_timeout
    );

    if !args.command.needs_pool() {
        return run_offline(&config, args.command).await;
    }

    if let Some(port) = args.metrics_port {
        install_prometheus_exporter(port)?;
    }

    let runner = CliRunner::new(config).await?;

    let result = tokio::select! {
        result = runner.run(args.command) => {
            info!("Application completed");
            result
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal");
            Ok(())
        }
    };

    info!("Shutting down...");
    runner.shutdown().await;

    if let Err(e) = result {
        error!("Application error: {:#}", e);
        std::process::exit(1);
    }

    info!("audit-browser-pool stopped");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use signal::unix::{signal as unix_signal, SignalKind};

    let (mut sigint, mut sigterm) = match (
        unix_signal(SignalKind::interrupt()),
        unix_signal(SignalKind::terminate()),
    ) {
        (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Failed to install signal handlers ({}), falling back to Ctrl-C", e);
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            return;
        }
    };

    tokio::select! {
        _ = sigint.recv() => {
            info!("Received SIGINT");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
