//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use std::path::PathBuf;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info};

use super::{handlers, models::ErrorResponse};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub document_path: PathBuf,
}

/// Routes plus middleware; static files are served as the fallback when configured
pub fn build_router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    let mut app = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/movies", get(list_items_handler))
        .with_state(state);

    if let Some(dir) = static_dir {
        info!("📁 Serving static files from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}

/// Configure and start the HTTP server
pub async fn start_http_server(state: AppState, static_dir: Option<PathBuf>, host: &str, port: u16) -> Result<()> {
    let app = build_router(state, static_dir);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    info!("🌐 API server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(handlers::health_check().await))
}

/// Catalog listing handler
async fn list_items_handler(State(state): State<AppState>) -> impl IntoResponse {
    match handlers::list_items(&state.document_path).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => {
            error!("Error fetching items: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to fetch items")),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_movies_endpoint_normalizes_legacy_items() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("movies.json");
        std::fs::write(&path, r#"[{"title": "Heat", "size": "1.2 GB", "link": "l"}]"#).unwrap();

        let app = build_router(AppState { document_path: path }, None);
        let (status, body) = get_json(app, "/api/movies").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["type"], "movie");
        assert_eq!(body[0]["id"], "movie-0");
    }

    #[tokio::test]
    async fn test_movies_endpoint_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("movies.json");
        std::fs::write(&path, "{ broken").unwrap();

        let app = build_router(AppState { document_path: path }, None);
        let (status, body) = get_json(app, "/api/movies").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch items");
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let dir = TempDir::new().unwrap();
        let app = build_router(
            AppState {
                document_path: dir.path().join("movies.json"),
            },
            None,
        );
        let (status, body) = get_json(app, "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
