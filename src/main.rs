use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use workreport::config::{Config, StoreBackend};
use workreport::store::{MemoryReportStore, PgReportStore, ReportStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.log_level)
        }))
        .init();

    tracing::info!("Starting work report service");

    let store: Arc<dyn ReportStore> = match (config.store, config.database_url.as_deref()) {
        (StoreBackend::Postgres, Some(database_url)) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(config.queue.store_timeout)
                .connect(database_url)
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Migrations applied");

            Arc::new(PgReportStore::new(pool))
        }
        (StoreBackend::Postgres, None) => {
            return Err("DATABASE_URL is required for the postgres store".into());
        }
        (StoreBackend::Memory, _) => {
            tracing::warn!("Using in-memory report store, reports are lost on restart");
            Arc::new(MemoryReportStore::new())
        }
    };

    let addr = SocketAddr::new(config.host, config.port);
    let (app, state) = workreport::build_app(store, config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown();
    let pending = state.queue.queue_status().pending;
    if pending > 0 {
        tracing::warn!("Shutting down with {pending} unprocessed submissions");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
