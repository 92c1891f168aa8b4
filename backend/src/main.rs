use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};

use crate::config::RelayConfig;
use crate::relay::RelayState;

mod config;
mod error;
mod handlers;
mod logging;
mod relay;

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(vec![header::CONTENT_TYPE])
}

fn build_router(state: Arc<RelayState>, config: &RelayConfig) -> Router {
    let static_dir = &config.static_dir;
    if !static_dir.exists() {
        warn!("Static directory {} does not exist", static_dir.display());
    }

    // Force revalidation so a redeployed page is picked up on reload.
    let cache_control_layer =
        SetResponseHeaderLayer::if_not_present(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    let static_service = cache_control_layer.layer(ServeDir::new(static_dir));

    Router::new()
        .route("/ws", get(relay::ws_handler))
        .route("/api/prizes", get(handlers::get_prizes).post(handlers::post_prizes))
        .route("/health", get(handlers::health))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route_service("/admin", ServeFile::new(static_dir.join("admin.html")))
        .fallback_service(static_service)
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    logging::setup();

    let config = RelayConfig::from_env();
    let state = Arc::new(RelayState::new(config.initial_prizes()));
    let app = build_router(state, &config);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("Prize wheel relay listening on {}", addr);
    info!("Serving static files from {}", config.static_dir.display());

    axum::serve(listener, app).await?;
    Ok(())
}
