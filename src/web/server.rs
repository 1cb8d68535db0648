//! Web server for the dashboard
//!
//! Provides an HTTP server using Axum to serve the page and the JSON API
//! endpoints.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::UiConfig;
use crate::dashboard::Dashboard;

use super::routes;

/// Shared application state
pub struct AppState {
    pub dashboard: Dashboard,
    pub ui: UiConfig,
    pub api_endpoint: Option<String>,
}

/// Configuration for the web server
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub open_browser: bool,
    pub api_endpoint: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8050,
            open_browser: true,
            api_endpoint: None,
        }
    }
}

/// Build the router over the shared state
pub fn router(state: Arc<AppState>) -> Router {
    // The API is read-only; a page served from elsewhere may call it
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .merge(routes::api_routes())
        .merge(routes::static_routes())
        .layer(cors)
        .with_state(state)
}

/// Start the web server and serve the dashboard
pub async fn start_server(
    dashboard: Dashboard,
    ui: UiConfig,
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = Arc::new(AppState {
        dashboard,
        ui,
        api_endpoint: config.api_endpoint.clone(),
    });

    let app = router(state);

    let ip: IpAddr = config.host.parse()?;
    let addr = SocketAddr::new(ip, config.port);
    let listener = TcpListener::bind(addr).await?;

    let url = format!("http://{}", addr);
    info!("Starting web server at {}", url);

    if config.open_browser {
        info!("Opening browser...");
        if let Err(e) = open::that(&url) {
            warn!("Could not open browser: {}", e);
            warn!("Please open {} manually", url);
        }
    }

    info!("Press Ctrl+C to stop the server");

    axum::serve(listener, app).await?;

    Ok(())
}
