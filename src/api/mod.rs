//! API handlers for the check-in REST endpoints

pub mod checkin;
pub mod health;
pub mod openapi;
pub mod scan_logs;
pub mod trustees;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, AppState};

/// Header carrying the kiosk operator label
pub const SCANNED_BY_HEADER: &str = "x-scanned-by";

/// Extractor for the optional operator label of the calling kiosk
pub struct Operator(pub Option<String>);

#[async_trait]
impl FromRequestParts<AppState> for Operator {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(SCANNED_BY_HEADER) else {
            return Ok(Operator(None));
        };

        let label = value
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid x-scanned-by header".to_string()))?
            .trim();

        if label.len() > state.config.server.max_operator_len {
            return Err(AppError::BadRequest("Operator label too long".to_string()));
        }

        Ok(Operator((!label.is_empty()).then(|| label.to_string())))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Check-in
        .route("/checkin", post(checkin::check_in))
        // Trustees
        .route("/trustees", get(trustees::list_trustees))
        .route("/trustees", post(trustees::create_trustee))
        .route("/trustees/:id", get(trustees::get_trustee))
        .route("/trustees/:id/scans", get(scan_logs::recent_scans))
        // Scan logs
        .route("/scan-logs", get(scan_logs::list_scan_logs))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
