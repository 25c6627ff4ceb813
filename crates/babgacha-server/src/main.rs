mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = babgacha_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = babgacha_db::PoolConfig {
        max_connections: config.db_max_connections,
        min_connections: config.db_min_connections,
        acquire_timeout_secs: config.db_acquire_timeout_secs,
    };
    let pool = babgacha_db::connect_pool(&config.database_url, pool_config).await?;
    babgacha_db::run_migrations(&pool).await?;

    let search = match config.naver_credentials() {
        Some((id, secret)) => {
            let client =
                babgacha_naver::LocalSearchClient::new(id, secret, config.search_timeout_secs)?;
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("naver credentials not set, nearby search disabled");
            None
        }
    };

    let app = build_app(AppState { pool, search });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
