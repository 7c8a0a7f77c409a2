//! knowify-server - serves the latest rejected Knowify projects over HTTP.
//!
//! Configuration comes from `~/.config/knowify-rejected/config.json`, a `.env`
//! file and `KNOWIFY_*` environment variables. The session file is owned by
//! this process; running several instances against one file is unsupported.

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use knowify_core::{Config, Knowify};
use knowify_server::logging::init_tracing;
use knowify_server::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load().context("Failed to load configuration")?;
    let _log_guard = init_tracing(config.log_dir.as_deref());
    info!("knowify-server starting");

    let knowify = Knowify::from_config(&config)?;
    let session_path = knowify.auth().store().path().to_path_buf();
    let app = router(AppState::new(knowify));

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!(
        addr = %listener.local_addr()?,
        session_file = %session_path.display(),
        sealed = config.session_key.is_some(),
        "Listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("knowify-server shutting down");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
