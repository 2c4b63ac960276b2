use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::config::ServerConfig;
use crate::store::ArtifactStore;
use crate::sweeper;

pub mod routes;

/// Server state
pub struct AppState {
    pub config: ServerConfig,
    pub store: ArtifactStore,
}

/// Build the application router. Separated from `start_server` so tests can
/// drive the routes without binding a socket.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::home))
        .route("/upload-file", post(routes::upload_file))
        .route("/execute-query", post(routes::execute_query))
        .route("/get-schema/{uuid}", get(routes::get_schema))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let store = ArtifactStore::open(&config.upload_dir)?;

    let cancel = CancellationToken::new();
    let sweeper = tokio::spawn(sweeper::run(
        store.root().to_path_buf(),
        config.retention(),
        config.sweep_interval(),
        config.exempt_file.clone(),
        cancel.clone(),
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(AppState { config, store });
    let app = create_router(state);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    cancel.cancel();
    sweeper.await?;

    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(err) => tracing::error!("Failed to listen for shutdown signal: {}", err),
    }
    cancel.cancel();
}
