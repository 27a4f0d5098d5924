use anyhow::{Context, Result};
use jemallocator::Jemalloc;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use shtmon::{Monitor, Settings};

#[tokio::main()]
async fn main() -> Result<()> {
    // Log everything the max level lets through; the level itself is set below
    SimpleLogger::new()
        .with_level(LevelFilter::Trace)
        .init()
        .context("Failed to initialize logger")?;
    log::set_max_level(Settings::startup_log_level());

    // Load configuration (.env, optional config file, environment)
    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load configuration. Please ensure RPC_URL is set: {}", e);
            return Ok(());
        },
    };
    log::set_max_level(settings.log_level_filter());

    let monitor = match Monitor::from_settings(settings) {
        Ok(monitor) => monitor,
        Err(e) => {
            error!("Failed to start monitor: {}", e);
            return Ok(());
        },
    };

    // No polling without a reachable node
    match monitor.check_connection().await {
        Ok(chain_id) => info!("Connected to RPC (chain id {})", chain_id),
        Err(e) => {
            error!("Failed to connect to RPC: {}", e);
            return Ok(());
        },
    }

    monitor.report_tokens().await;
    info!(
        "Appending observations to {}",
        monitor.settings().observation_log_path.display()
    );

    let cancellation_token = CancellationToken::new();

    let shutdown_token = cancellation_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!("Failed to listen for shutdown signals: {:#}", e);
            return;
        }
        info!("Finishing current cycle and exiting gracefully...");
        shutdown_token.cancel();
    });

    monitor.run(cancellation_token).await
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm_stream =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res.context("Failed to listen for Ctrl+C")?;
                info!("Received shutdown signal (Ctrl+C)");
            },
            _ = sigterm_stream.recv() => {
                info!("Received SIGTERM");
            },
        };
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl+C")?;
        info!("Received shutdown signal (Ctrl+C)");
    }

    Ok(())
}
