//! Trustee endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::trustee::{CreateTrustee, Trustee},
};

/// List trustees
#[utoipa::path(
    get,
    path = "/trustees",
    tag = "trustees",
    responses(
        (status = 200, description = "Trustees ordered by name", body = Vec<Trustee>)
    )
)]
pub async fn list_trustees(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Trustee>>> {
    let trustees = state.services.trustees.list().await?;
    Ok(Json(trustees))
}

/// Get a trustee
#[utoipa::path(
    get,
    path = "/trustees/{id}",
    tag = "trustees",
    params(("id" = Uuid, Path, description = "Trustee ID")),
    responses(
        (status = 200, description = "Trustee", body = Trustee),
        (status = 404, description = "Trustee not found")
    )
)]
pub async fn get_trustee(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Trustee>> {
    let trustee = state.services.trustees.get(id).await?;
    Ok(Json(trustee))
}

/// Create a trustee
#[utoipa::path(
    post,
    path = "/trustees",
    tag = "trustees",
    request_body = CreateTrustee,
    responses(
        (status = 201, description = "Trustee created", body = Trustee),
        (status = 400, description = "Invalid fields"),
        (status = 409, description = "QR code already assigned")
    )
)]
pub async fn create_trustee(
    State(state): State<crate::AppState>,
    Json(data): Json<CreateTrustee>,
) -> AppResult<(StatusCode, Json<Trustee>)> {
    let trustee = state.services.trustees.create(data).await?;
    Ok((StatusCode::CREATED, Json(trustee)))
}
