mod api;
mod middleware;
mod password;
mod session;
mod state;

use std::net::SocketAddr;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
    session::SessionStore,
    state::CatalogHandle,
};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = lumina_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting lumina-server");

    let pool_config = lumina_db::PoolConfig::from_app_config(&config);
    let pool = lumina_db::connect_pool(&config.database_url, pool_config).await?;
    lumina_db::run_migrations(&pool).await?;

    let (catalog, report) = CatalogHandle::load(config.data_dir.clone()).await?;
    if !report.products.is_loaded() {
        tracing::warn!(
            data_dir = %config.data_dir.display(),
            "no product matrix loaded; search and top products will be empty"
        );
    }

    let sessions = SessionStore::new(
        &config.session_cookie_name,
        Duration::from_secs(config.session_ttl_secs),
        !config.is_development(),
    );
    spawn_session_purger(sessions.clone());

    let auth = AuthState::from_env(config.is_development())?;
    let state = AppState {
        pool,
        catalog,
        sessions,
        password_rounds: password::DEFAULT_ROUNDS,
    };
    let app = build_app(
        state,
        auth,
        default_rate_limit_state(),
        config.static_dir.clone(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

fn spawn_session_purger(sessions: SessionStore) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "expired sessions purged");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
