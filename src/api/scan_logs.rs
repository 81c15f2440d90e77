//! Scan log endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::scan_log::{RecentScan, RecentScanQuery, ScanLogEntry},
};

/// List every scan log row with trustee details, newest first.
/// Filtering, sorting and paging are left to the log browser.
#[utoipa::path(
    get,
    path = "/scan-logs",
    tag = "scan_logs",
    responses(
        (status = 200, description = "All scan logs", body = Vec<ScanLogEntry>)
    )
)]
pub async fn list_scan_logs(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<ScanLogEntry>>> {
    let logs = state.services.scan_logs.list_all().await?;
    Ok(Json(logs))
}

/// Recent scans of one trustee
#[utoipa::path(
    get,
    path = "/trustees/{id}/scans",
    tag = "scan_logs",
    params(
        ("id" = Uuid, Path, description = "Trustee ID"),
        RecentScanQuery
    ),
    responses(
        (status = 200, description = "Recent scans, newest first", body = Vec<RecentScan>),
        (status = 404, description = "Trustee not found")
    )
)]
pub async fn recent_scans(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<RecentScanQuery>,
) -> AppResult<Json<Vec<RecentScan>>> {
    let scans = state.services.scan_logs.recent_for_trustee(id, query.limit).await?;
    Ok(Json(scans))
}
