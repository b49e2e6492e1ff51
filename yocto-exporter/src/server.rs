// Yocto Exporter - Prometheus exporter for Yoctopuce sensor hubs
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! HTTP surface
//!
//! Every scrape of the metrics route runs one collection pass on the
//! blocking pool; hub calls never execute on an async worker.

use crate::error::ExporterError;
use crate::metrics::{encode_metrics, CONTENT_TYPE};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info};
use yocto_metrics::HubCollector;

/// Application state shared across handlers.
pub struct AppState {
    pub collector: Arc<HubCollector>,
    pub hub_url: String,
    pub metrics_path: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(collector: Arc<HubCollector>, hub_url: String, metrics_path: String) -> Self {
        Self {
            collector,
            hub_url,
            metrics_path,
            start_time: Instant::now(),
        }
    }
}

/// Build the router. Auxiliary routes that collide with the metrics
/// path are left out.
pub fn router(state: Arc<AppState>) -> Router {
    let metrics_path = state.metrics_path.clone();
    let mut app = Router::new().route(&metrics_path, get(metrics_handler));

    if metrics_path != "/" {
        app = app.route("/", get(root_handler));
    }
    if metrics_path != "/health" {
        app = app.route("/health", get(health_handler));
    }
    if metrics_path != "/status" {
        app = app.route("/status", get(status_handler));
    }

    app.with_state(state)
}

/// Bind `addr` and serve until ctrl-c or SIGTERM.
pub async fn serve(state: Arc<AppState>, addr: &str) -> Result<(), ExporterError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ExporterError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!("Starting server on http://{}", addr);
    info!("Metrics endpoint: http://{}{}", addr, state.metrics_path);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ExporterError::Serve)?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
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
                error!("Failed to listen for SIGTERM: {}", e);
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

/// Root handler - shows a simple HTML page.
async fn root_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Yocto Exporter</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 800px; margin: 50px auto; padding: 20px; }}
        h1 {{ color: #2c3e50; }}
        a {{ color: #3498db; text-decoration: none; }}
        .endpoints {{ background: #f8f9fa; padding: 20px; border-radius: 8px; margin: 20px 0; }}
        .endpoint {{ margin: 10px 0; }}
    </style>
</head>
<body>
    <h1>Yocto Exporter</h1>
    <p>Prometheus exporter for Yoctopuce sensors.</p>

    <div class="endpoints">
        <h2>Endpoints</h2>
        <div class="endpoint"><a href="{path}">{path}</a> - Prometheus metrics</div>
        <div class="endpoint"><a href="/health">/health</a> - Health check</div>
        <div class="endpoint"><a href="/status">/status</a> - Status information (JSON)</div>
    </div>
</body>
</html>"#,
        path = state.metrics_path
    ))
}

/// Metrics handler - one collection pass per scrape.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let collector = Arc::clone(&state.collector);
    let families = match tokio::task::spawn_blocking(move || collector.collect_pass()).await {
        Ok(families) => families,
        Err(e) => {
            error!("Collection pass failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "collection failed").into_response();
        }
    };

    match encode_metrics(&families) {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "encoding failed").into_response()
        }
    }
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Status information response.
#[derive(Serialize)]
struct StatusResponse {
    version: String,
    uptime_secs: u64,
    hub_url: String,
    series_count: usize,
}

/// Status handler - returns JSON status information.
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    // Waits behind a running pass, so keep it off the async workers too
    let collector = Arc::clone(&state.collector);
    let series_count = tokio::task::spawn_blocking(move || collector.series_count())
        .await
        .unwrap_or(0);

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        hub_url: state.hub_url.clone(),
        series_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tower::ServiceExt;
    use yocto_metrics::{hub, UnitOverrides};

    fn readings_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "function_id,hardware_id,unit,value").unwrap();
        writeln!(file, "temperature,METEO-1.temperature,'C,21.5").unwrap();
        writeln!(file, "humidity,METEO-1.humidity,%RH,40").unwrap();
        file.flush().unwrap();
        file
    }

    fn state_for(file: &NamedTempFile, metrics_path: &str) -> Arc<AppState> {
        let url = format!("csv:{}", file.path().display());
        let hub = hub::connect(&url).unwrap();
        let overrides = UnitOverrides::from_pairs([("temperature", "C")]);
        let collector = Arc::new(HubCollector::new(hub, overrides));
        Arc::new(AppState::new(collector, url, metrics_path.to_string()))
    }

    async fn request(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_metrics_route() {
        let file = readings_file();
        let (status, content_type, body) = request(router(state_for(&file, "/metrics")), "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some(CONTENT_TYPE));
        assert!(body.contains("# TYPE temperature gauge"));
        assert!(body.contains("hardwareId=\"METEO-1.temperature\""));
        assert!(body.contains("unit=\"C\""));
        assert!(body.contains("unit=\"%RH\""));
    }

    #[tokio::test]
    async fn test_custom_metrics_path() {
        let file = readings_file();
        let state = state_for(&file, "/probe");

        let (status, _, body) = request(router(Arc::clone(&state)), "/probe").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("humidity"));

        let (status, _, _) = request(router(state), "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_at_root() {
        let file = readings_file();
        let (status, content_type, body) = request(router(state_for(&file, "/")), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some(CONTENT_TYPE));
        assert!(body.contains("temperature"));
    }

    #[tokio::test]
    async fn test_health() {
        let file = readings_file();
        let (status, _, body) = request(router(state_for(&file, "/metrics")), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_status_counts_series_after_scrape() {
        let file = readings_file();
        let state = state_for(&file, "/metrics");

        let (_, _, body) = request(router(Arc::clone(&state)), "/status").await;
        let status: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(status["series_count"], 0);
        assert_eq!(status["version"], env!("CARGO_PKG_VERSION"));
        assert!(status["hub_url"].as_str().unwrap().starts_with("csv:"));

        request(router(Arc::clone(&state)), "/metrics").await;

        let (_, _, body) = request(router(state), "/status").await;
        let status: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(status["series_count"], 2);
    }

    #[tokio::test]
    async fn test_root_page_links_metrics_path() {
        let file = readings_file();
        let (status, _, body) = request(router(state_for(&file, "/probe")), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("href=\"/probe\""));
    }

    #[tokio::test]
    async fn test_bind_failure() {
        let file = readings_file();
        let result = serve(state_for(&file, "/metrics"), "not-an-address").await;
        assert!(matches!(result, Err(ExporterError::Bind { .. })));
    }
}
