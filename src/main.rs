use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use status_updates::config::Config;
use status_updates::discord::{DiscordApiError, DiscordClient};
use status_updates::persistence::{FileIncidentStore, StoreError};
use status_updates::reconciler::Reconciler;
use status_updates::scheduler::Scheduler;
use status_updates::server::{AppState, build_router};
use status_updates::statuspage::{FetchError, StatuspageClient};

#[derive(Debug, Error)]
enum StartupError {
    #[error("failed to open incident store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to build Discord client: {0}")]
    Discord(#[from] DiscordApiError),

    #[error("failed to build Statuspage client: {0}")]
    Statuspage(#[from] FetchError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("status-updates: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn run(config: Config) -> Result<(), StartupError> {
    info!(?config, "Starting status-updates");

    let store = Arc::new(FileIncidentStore::open(&config.state_path)?);
    let discord = DiscordClient::new(&config.discord.token, &config.discord.api_base)?;
    let statuspage = StatuspageClient::new(
        &config.statuspage.api_base,
        &config.statuspage.page_id,
        &config.statuspage.api_key,
    )?;

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let scheduler = if config.daemon.enabled {
        let reconciler = Reconciler::new(
            statuspage,
            discord.clone(),
            Arc::clone(&store),
            config.reconciler_config(),
        );
        let scheduler = Scheduler::new(reconciler, config.schedule_config());
        Some(tokio::spawn(scheduler.run(shutdown.clone())))
    } else {
        info!("Daemon disabled, serving interactions only");
        None
    };

    let state = AppState::new(
        config.discord.public_key,
        config.discord.guild_id,
        store,
        discord,
    );

    let listener = TcpListener::bind(config.server_addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: config.server_addr,
            source,
        })?;
    info!(addr = %config.server_addr, "Interaction server listening");

    let server_shutdown = shutdown.clone();
    let served = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await;

    // The server may also stop on its own error; the scheduler goes with it.
    shutdown.cancel();
    if let Some(handle) = scheduler
        && let Err(e) = handle.await
    {
        error!(error = %e, "Scheduler task panicked");
    }

    served.map_err(StartupError::Serve)?;
    info!("Shutdown complete");
    Ok(())
}

/// Cancels `shutdown` on Ctrl-C or SIGTERM.
async fn cancel_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
        _ = shutdown.cancelled() => return,
    }
    shutdown.cancel();
}
