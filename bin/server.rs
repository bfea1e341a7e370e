// Fin API - Web Server

use anyhow::{Context, Result};
use fin_api::{create_router, AppState, Config, InMemoryLedgerStore, LedgerStore, SqliteLedgerStore, StoreKind};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn open_store(config: &Config) -> Result<Arc<dyn LedgerStore>> {
    match config.store {
        StoreKind::Sqlite => {
            let store = SqliteLedgerStore::open(&config.database)?;
            tracing::info!(database = ?config.database, "SQLite ledger store opened");
            Ok(Arc::new(store))
        }
        StoreKind::Memory => {
            tracing::warn!("in-memory ledger store: data is lost on shutdown");
            Ok(Arc::new(InMemoryLedgerStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fin_api=debug,fin_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(bind = %config.bind_address(), store = ?config.store, "starting Fin API");

    let state = AppState::new(open_store(&config)?);

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address()))?;

    tracing::info!("server running on http://{}", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}
