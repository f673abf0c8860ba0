//! Web server for the quakemap page.
//!
//! Every load of `/` fetches the feed again and draws a fresh map, so the
//! page is never staler than the feed. Each request gets its own map value;
//! nothing mutable is shared between requests.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};

use crate::client::UsgsClient;
use crate::legend::{legend, legend_table};
use crate::map::MapConfig;
use crate::pipeline::render_page;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// GeoJSON feed fetched on every page load
    pub feed_url: String,
    /// Feed name shown on the page
    pub feed_label: String,
    pub map: MapConfig,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
}

/// Create the Axum router with all routes.
pub fn create_router(config: ServerConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(map_handler))
        .route("/legend", get(legend_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Start the web server.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = create_router(config);

    tracing::info!("quakemap serving at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Map page handler - fetches the feed and renders the page.
///
/// The feed client and pipeline are blocking, so the work runs on the
/// blocking pool. A failed fetch still returns the page (without markers)
/// with a 502 status.
async fn map_handler(State(state): State<AppState>) -> Response {
    let config = state.config.clone();

    let result = tokio::task::spawn_blocking(move || {
        let client = UsgsClient::with_url(config.feed_url.clone())?;
        let (page, report) = render_page(&client, &config.map, &config.feed_label);
        page.render().map(|html| (html, report.fetched()))
    })
    .await;

    match result {
        Ok(Ok((html, true))) => Html(html).into_response(),
        Ok(Ok((html, false))) => (StatusCode::BAD_GATEWAY, Html(html)).into_response(),
        Ok(Err(e)) => {
            tracing::error!("failed to render map page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render map page").into_response()
        }
        Err(e) => {
            tracing::error!("render task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render map page").into_response()
        }
    }
}

/// Legend as plain text.
async fn legend_handler() -> String {
    legend_table(legend())
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            port: 0,
            host: "127.0.0.1".into(),
            // Port 9 (discard) refuses connections, so the fetch fails fast
            feed_url: "http://127.0.0.1:9/feed.geojson".into(),
            feed_label: "local".into(),
            map: MapConfig::world(),
        }
    }

    /// Serve the router on an ephemeral port and GET `path` from it.
    async fn get(path: &str) -> (u16, String) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, create_router(test_config())).await.unwrap();
        });

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let response = client
            .get(format!("http://{addr}{path}"))
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.text().await.unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get("/health").await;
        assert_eq!(status, 200);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_legend_route() {
        let (status, body) = get("/legend").await;
        assert_eq!(status, 200);
        assert!(body.contains("30–50"));
    }

    #[tokio::test]
    async fn test_map_page_when_feed_unreachable() {
        let (status, body) = get("/").await;
        assert_eq!(status, 502);
        assert!(body.contains("<!DOCTYPE html>"));
        assert!(body.contains("Feed local unavailable"));
        assert!(body.contains(r#""markers":[]"#));
    }
}
