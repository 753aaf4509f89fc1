mod api;
mod middleware;

use std::sync::Arc;

use anyhow::Context;
use clinnect_core::SessionSettings;
use clinnect_db::PgProviderDirectory;
use clinnect_maps::{NominatimClient, OsrmClient};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = clinnect_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = clinnect_db::PoolConfig::from_app_config(&config);
    let pool = clinnect_db::connect_pool(&config.database_url, pool_config).await?;
    clinnect_db::run_migrations(&pool).await?;

    let router = OsrmClient::with_base_url(
        &config.osrm_base_url,
        config.upstream_timeout_secs,
        &config.user_agent,
    )
    .context("failed to build OSRM client")?;
    let geocoder = NominatimClient::with_base_url(
        &config.nominatim_base_url,
        config.upstream_timeout_secs,
        &config.user_agent,
    )
    .context("failed to build Nominatim client")?;

    let state = AppState {
        pool: Some(pool.clone()),
        directory: Arc::new(PgProviderDirectory::new(pool)),
        router: Arc::new(router),
        geocoder: Arc::new(geocoder),
        settings: SessionSettings::from_app_config(&config),
    };
    let app = build_app(state, default_rate_limit_state());

    tracing::info!(env = %config.env, addr = %config.bind_addr, "starting server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
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
