//! HTTP routes for the dashboard
//!
//! Provides API endpoints for tab content and static file serving.

use std::path::{Component, Path as FsPath};
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use rust_embed::RustEmbed;
use serde::Serialize;
use tracing::error;

use crate::tabs::{self, TabEntry};

use super::server::AppState;

/// Embedded static assets
#[derive(RustEmbed)]
#[folder = "web-assets/"]
struct Assets;

/// Frontend configuration
#[derive(Serialize)]
struct FrontendConfig {
    title: String,
    subtitle: String,
    footer: String,
    logo: Option<String>,
    api_endpoint: Option<String>,
}

/// Row counts shown under the page header
#[derive(Serialize)]
struct SummaryResponse {
    rows: usize,
    columns: Vec<String>,
    missing_department: usize,
    missing_municipality: usize,
    missing_cause: usize,
    has_map: bool,
}

/// Create API routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tabs", get(get_tabs))
        .route("/api/tab", get(get_default_tab))
        .route("/api/tab/{id}", get(get_tab))
        .route("/api/geojson", get(get_geojson))
        .route("/api/summary", get(get_summary))
        .route("/api/config", get(get_config))
        .route("/api/health", get(health_check))
}

/// Create static file routes
pub fn static_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index_html))
        .route("/assets/{*path}", get(asset_handler))
        .route("/{*path}", get(static_handler))
}

/// GET /api/tabs - Sidebar entries in order
async fn get_tabs() -> Json<Vec<TabEntry>> {
    Json(tabs::sidebar())
}

/// GET /api/tab - Content shown before any tab is clicked
async fn get_default_tab(State(state): State<Arc<AppState>>) -> Response {
    render(state, None).await
}

/// GET /api/tab/{id} - Content for one tab
async fn get_tab(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    render(state, Some(id)).await
}

/// Aggregations run polars queries; keep them off the async workers
async fn render(state: Arc<AppState>, tab_id: Option<String>) -> Response {
    let id = tab_id.clone();
    let rendered =
        tokio::task::spawn_blocking(move || state.dashboard.render(id.as_deref())).await;

    match rendered {
        Ok(Ok(content)) => Json(content).into_response(),
        Ok(Err(e)) => {
            error!("Failed to render tab {:?}: {}", tab_id, e);
            internal_error(e.to_string())
        }
        Err(e) => {
            error!("Render task for tab {:?} failed: {}", tab_id, e);
            internal_error(e.to_string())
        }
    }
}

fn internal_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

/// GET /api/geojson - Department boundaries for the map
async fn get_geojson(State(state): State<Arc<AppState>>) -> Response {
    match state.dashboard.boundaries() {
        Some(boundaries) => (
            [(header::CONTENT_TYPE, "application/geo+json")],
            boundaries.body().to_string(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "GeoJSON not available"})),
        )
            .into_response(),
    }
}

/// GET /api/summary - Size of the loaded table and join misses
async fn get_summary(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    let table = state.dashboard.table();
    let stats = table.stats();
    Json(SummaryResponse {
        rows: stats.rows,
        columns: table.column_names(),
        missing_department: stats.missing_department,
        missing_municipality: stats.missing_municipality,
        missing_cause: stats.missing_cause,
        has_map: state.dashboard.boundaries().is_some(),
    })
}

/// GET /api/config - Returns frontend configuration
async fn get_config(State(state): State<Arc<AppState>>) -> Json<FrontendConfig> {
    Json(FrontendConfig {
        title: state.ui.title.clone(),
        subtitle: state.ui.subtitle.clone(),
        footer: state.ui.footer.clone(),
        logo: state
            .ui
            .logo
            .as_ref()
            .filter(|_| state.ui.assets_dir.is_some())
            .map(|logo| format!("/assets/{}", logo)),
        api_endpoint: state.api_endpoint.clone(),
    })
}

/// GET /api/health - Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// GET / - Serve index.html
async fn index_html() -> impl IntoResponse {
    match Assets::get("index.html") {
        Some(content) => Html(content.data.into_owned()).into_response(),
        None => (StatusCode::NOT_FOUND, "index.html not found").into_response(),
    }
}

/// GET /assets/{*path} - Files from the configured assets directory
async fn asset_handler(State(state): State<Arc<AppState>>, Path(path): Path<String>) -> Response {
    let Some(dir) = &state.ui.assets_dir else {
        return not_found(&path);
    };

    // Security: only plain relative paths inside the assets directory
    let relative = FsPath::new(&path);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return (StatusCode::BAD_REQUEST, "Invalid asset path").into_response();
    }

    match tokio::fs::read(dir.join(relative)).await {
        Ok(bytes) => with_mime(&path, bytes),
        Err(_) => not_found(&path),
    }
}

/// Static file handler for embedded assets
async fn static_handler(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');

    match Assets::get(path) {
        Some(content) => with_mime(path, content.data.into_owned()),
        None => not_found(path),
    }
}

fn with_mime(path: &str, body: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    ([(header::CONTENT_TYPE, mime.to_string())], body).into_response()
}

fn not_found(path: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("File not found: {}", path)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UiConfig;
    use crate::dashboard::Dashboard;
    use crate::dataset::fixtures;
    use axum::body::to_bytes;

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            dashboard: Dashboard::new(fixtures::table(), None, "properties.NOMBRE_DPT"),
            ui: UiConfig::default(),
            api_endpoint: None,
        })
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_get_tab_renders_on_blocking_pool() {
        let response = get_tab(State(state()), Path("meses".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["kind"], "graph");
        assert_eq!(body["figure"]["data"][0]["type"], "scatter");
    }

    #[tokio::test]
    async fn test_default_tab_is_map() {
        let response = get_default_tab(State(state())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(
            body["figure"]["layout"]["title"]["text"],
            "Defunciones por departamento (GeoJSON no encontrado)"
        );
    }

    #[tokio::test]
    async fn test_unknown_tab_is_not_an_error() {
        let response = get_tab(State(state()), Path("tab-99".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["kind"], "message");
    }

    #[tokio::test]
    async fn test_geojson_missing() {
        let response = get_geojson(State(state())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
