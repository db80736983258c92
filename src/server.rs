use crate::announce::{self, Announcement};
use crate::cache::ContestCache;
use crate::error::ScraperError;
use crate::types::{ContestRecord, Site};
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use hyper::Server;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, info};

const PREFLIGHT_ALLOW_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, \
Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ContestCache>,
    pub metrics: Option<PrometheusHandle>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// JSON error response `{error, message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Invalid request",
            message: message.into(),
        }
    }
}

impl From<ScraperError> for ApiError {
    fn from(err: ScraperError) -> Self {
        error!("Contest refresh failed: {}", err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Failed to fetch contests",
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ContestQuery {
    pub site: Option<String>,
}

impl ContestQuery {
    fn site(&self) -> Result<Option<Site>, ApiError> {
        self.site
            .as_deref()
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
            .map(str::parse::<Site>)
            .transpose()
            .map_err(|e| ApiError::bad_request(e.to_string()))
    }
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "contest_scraper",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

async fn list_contests(
    State(state): State<AppState>,
    Query(query): Query<ContestQuery>,
) -> Result<Json<Vec<ContestRecord>>, ApiError> {
    let site = query.site()?;
    let contests = state.cache.get().await?;
    Ok(Json(announce::filter_by_site(&contests, site)))
}

async fn list_atcoder_contests(State(state): State<AppState>) -> Result<Json<Vec<ContestRecord>>, ApiError> {
    let contests = state.cache.get().await?;
    Ok(Json(announce::filter_by_site(&contests, Some(Site::AtCoder))))
}

async fn list_announcements(
    State(state): State<AppState>,
    Query(query): Query<ContestQuery>,
) -> Result<Json<Vec<Announcement>>, ApiError> {
    let site = query.site()?;
    let contests = state.cache.get().await?;
    let announcements = announce::filter_by_site(&contests, site)
        .iter()
        .map(Announcement::from)
        .collect();
    Ok(Json(announcements))
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true")),
            (header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET,OPTIONS")),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(PREFLIGHT_ALLOW_HEADERS)),
        ],
    )
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody {
            error: "Method not allowed",
            message: "Only GET requests are supported".to_string(),
        }),
    )
}

/// Create the HTTP router with all routes
pub fn create_server(state: AppState) -> Router {
    // Every response, errors included, is readable cross-origin
    let allow_origin = SetResponseHeaderLayer::if_not_present(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route(
            "/api/contests",
            get(list_contests).options(preflight).fallback(method_not_allowed),
        )
        .route(
            "/api/atcoder/contests",
            get(list_atcoder_contests).options(preflight).fallback(method_not_allowed),
        )
        .route(
            "/api/announcements",
            get(list_announcements).options(preflight).fallback(method_not_allowed),
        )
        .with_state(state)
        .layer(ServiceBuilder::new().layer(allow_origin))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}

/// Start the HTTP server on the specified port
pub async fn start_server(state: AppState, port: u16) -> Result<(), hyper::Error> {
    let app = create_server(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "HTTP server running");
    info!("Contests:     http://localhost:{port}/api/contests");
    info!("Health check: http://localhost:{port}/health");

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
}
