//! Host agent binary.
//!
//! Loads settings, then serves the HTTP router until Ctrl-C or SIGTERM.

use anyhow::{Context, Result};
use host_agent_config::Settings;
use host_agent_server::{AppState, router};
use host_agent_types::DirectoryName;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

/// Missing directories are not fatal; requests against them answer 404.
fn warn_missing_directories(settings: &Settings) {
    for directory in DirectoryName::ALL {
        let path = settings.search_root.join(directory.dir_name());
        if !path.is_dir() {
            tracing::warn!(%directory, path = %path.display(), "Searchable directory is missing");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let settings = Settings::load().context("failed to load configuration")?;
    tracing::debug!(?settings, "Configuration resolved");
    warn_missing_directories(&settings);

    let address = settings.bind_address();
    let app = router(AppState::from_settings(&settings));
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!(%address, "HostAgent listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated with an error")?;
    Ok(())
}
