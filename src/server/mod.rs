use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::{self, TraceLayer},
};
use tracing::{info, warn, Level};

pub mod error;
pub mod handlers;
pub mod state;

use crate::constants::UPLOADS_URL_PREFIX;

use self::state::AppState;
use handlers::{
    add_page, asset, delete_travel, exif_gps, generate_title, index_page, list_travels, reverse_geocode,
    travel_page, upload,
};

// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.settings.upload_dir);
    let body_limit = state.settings.body_limit_bytes();

    Router::new()
        .route("/", get(index_page))
        .route("/add", get(add_page))
        .route("/travel/:id", get(travel_page))
        .route("/assets/*path", get(asset))
        .route("/api/upload", post(upload))
        .route("/api/generate-title", post(generate_title))
        .route("/api/travel/:id", delete(delete_travel))
        .route("/api/travels", get(list_travels))
        .route("/api/reverse-geocode", post(reverse_geocode))
        .route("/api/exif/gps", post(exif_gps))
        .nest_service(UPLOADS_URL_PREFIX, uploads)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.settings.host, state.settings.port);
    let app = create_app(state);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Travel diary running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
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
                warn!("Failed to install SIGTERM handler: {e}");
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
    info!("Shutdown signal received");
}
