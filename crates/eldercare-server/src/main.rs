use std::sync::Arc;

use anyhow::Context;
use eldercare_core::workflow::AccountService;
use eldercare_core::Database;
use eldercare_server::config::Config;
use eldercare_server::dispatch::LogNotifier;
use eldercare_server::{build_router, AppState};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(Config::log_filter()))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load()?;
    info!(db = %config.db_path.display(), "opening database");
    let db = Database::open(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;

    match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(password)) => {
            let admin = AccountService::new(&db).bootstrap_admin(email, password)?;
            info!(admin_id = %admin.id, "admin account ready");
        }
        (Some(_), None) | (None, Some(_)) => {
            warn!("ELDERCARE_ADMIN_EMAIL and ELDERCARE_ADMIN_PASSWORD must both be set, skipping admin bootstrap");
        }
        (None, None) => {}
    }

    let state = AppState::new(
        db,
        config.workflow_settings(),
        config.session_ttl_hours,
        Arc::new(LogNotifier),
    );
    let app = build_router(state);

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    info!("Server running on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
