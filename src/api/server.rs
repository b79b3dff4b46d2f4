use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::middleware;
use axum::{Router, extract::Request, response::Response};
use http::{HeaderValue, header};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::ai::chat::Relay;
use crate::api::state::{AppState, SharedState};
use crate::core::AppConfig;

async fn set_static_cache_control(request: Request, next: middleware::Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

pub fn app(shared_state: SharedState) -> Router {
    let cors = CorsLayer::permissive();
    let static_path = Path::new(&shared_state.config.static_path);

    // Landing page and its assets
    let assets: Router<SharedState> = Router::new()
        .route_service("/", ServeFile::new(static_path.join("index.html")))
        .route_service("/loader.gif", ServeFile::new(static_path.join("loader.gif")))
        .layer(middleware::from_fn(set_static_cache_control));

    Router::new()
        .merge(routes::router())
        .merge(assets)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::clone(&shared_state))
}

// Run the server
pub async fn serve(config: AppConfig) -> Result<()> {
    let relay = Relay::from_config(&config);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::debug!(
        model = %config.gemini_model,
        commit_mode = %config.commit_mode,
        context_window = ?config.context_window,
        "Starting chat relay"
    );

    let shared_state = Arc::new(AppState::new(config, relay));
    let app = app(shared_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
