//! depot-api — HTTP surface of the Depot storage service.

pub mod handlers;
pub mod media;
pub mod session;
pub mod store;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::ApiState;

use depot_core::CELL_SIZE;

/// Router over the full API surface.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/register", post(handlers::handle_register))
        .route("/storage", get(handlers::handle_storage_list))
        .route("/upload_init", post(handlers::handle_init_upload))
        .route(
            "/upload",
            // One cell plus multipart framing.
            post(handlers::handle_upload_cell).layer(DefaultBodyLimit::max(CELL_SIZE + 64 * 1024)),
        )
        .route("/download_init", get(handlers::handle_download_init))
        .route("/download/{*path}", get(handlers::handle_download_cell))
        .layer(cors)
        .with_state(state)
}

/// Binds `addr:port` and serves until the listener dies.
pub async fn serve(state: ApiState, addr: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(format!("{addr}:{port}")).await?;
    tracing::info!(%addr, port, "depot API listening");
    axum::serve(listener, app).await?;
    Ok(())
}
