mod api;
mod middleware;
mod password;
mod session;

use std::sync::Arc;
use std::time::Duration;

use farmdrop_core::{AppConfig, DeliveryEngine, Environment};
use farmdrop_geocode::{Geocoder, MapboxClient};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    session::SessionStore,
};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = farmdrop_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = farmdrop_db::PoolConfig::from_app_config(&config);
    let pool = farmdrop_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = farmdrop_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations complete");

    let sessions = SessionStore::new(
        &config.session_secret,
        Duration::from_secs(config.session_ttl_secs),
        matches!(config.env, Environment::Production),
    );
    spawn_session_purge(sessions.clone());

    let engine = DeliveryEngine::new(config.farm_origin);
    tracing::info!(origin = %engine.origin(), "delivery engine ready");

    let state = AppState {
        pool,
        engine,
        geocoder: build_geocoder(&config)?,
        sessions,
    };
    let app = build_app(state, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "farmdrop server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_geocoder(config: &AppConfig) -> anyhow::Result<Option<Arc<dyn Geocoder>>> {
    let Some(token) = config.mapbox_access_token.as_deref() else {
        tracing::warn!("MAPBOX_ACCESS_TOKEN not set; address lookups are disabled");
        return Ok(None);
    };
    let client = MapboxClient::new(token, config.geocode_timeout_secs)?
        .with_retry(config.geocode_max_retries, config.geocode_retry_backoff_ms);
    Ok(Some(Arc::new(client)))
}

fn spawn_session_purge(sessions: SessionStore) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "expired sessions removed");
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
