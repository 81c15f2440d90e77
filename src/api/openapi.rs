//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{checkin, health, scan_logs, trustees};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Trustee Check-In API",
        version = "1.0.0",
        description = "QR check-in validation and scan log REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Check-in
        checkin::check_in,
        // Trustees
        trustees::list_trustees,
        trustees::get_trustee,
        trustees::create_trustee,
        // Scan logs
        scan_logs::list_scan_logs,
        scan_logs::recent_scans,
    ),
    components(
        schemas(
            // Check-in
            crate::models::checkin::CheckInRequest,
            crate::models::checkin::CheckInResponse,
            crate::models::checkin::FailureReason,
            // Trustees
            crate::models::trustee::Trustee,
            crate::models::trustee::CreateTrustee,
            // Scan logs
            crate::models::scan_log::ScanLogEntry,
            crate::models::scan_log::TrusteeSummary,
            crate::models::scan_log::RecentScan,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "checkin", description = "QR code check-in"),
        (name = "trustees", description = "Trustee records"),
        (name = "scan_logs", description = "Scan audit log")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
