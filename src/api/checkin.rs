//! Check-in endpoint

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::checkin::{CheckInRequest, CheckInResponse},
};

use super::Operator;

/// Validate a scanned QR code and record the check-in.
///
/// Refusals (unknown code, daily limit, failed write) are returned with
/// status 200 and `success = false`.
#[utoipa::path(
    post,
    path = "/checkin",
    tag = "checkin",
    request_body = CheckInRequest,
    params(
        ("x-scanned-by" = Option<String>, Header, description = "Operator label of the kiosk")
    ),
    responses(
        (status = 200, description = "Validation outcome", body = CheckInResponse),
        (status = 400, description = "Empty or oversized code"),
        (status = 500, description = "Unexpected store failure")
    )
)]
pub async fn check_in(
    State(state): State<crate::AppState>,
    Operator(operator): Operator,
    Json(mut request): Json<CheckInRequest>,
) -> AppResult<Json<CheckInResponse>> {
    request.qr_code = request.qr_code.trim().to_string();
    request.validate()?;

    let outcome = state
        .services
        .checkin
        .validate(&request.qr_code, operator.as_deref())
        .await?;

    Ok(Json(outcome.into()))
}
