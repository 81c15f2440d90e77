//! Trustee management service

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{CreateTrustee, Trustee},
    repository::CheckInStore,
};

#[derive(Clone)]
pub struct TrusteesService {
    store: Arc<dyn CheckInStore>,
}

impl TrusteesService {
    pub fn new(store: Arc<dyn CheckInStore>) -> Self {
        Self { store }
    }

    /// List all trustees
    pub async fn list(&self) -> AppResult<Vec<Trustee>> {
        self.store.list_trustees().await
    }

    /// Get a trustee by ID
    pub async fn get(&self, id: Uuid) -> AppResult<Trustee> {
        self.store
            .get_trustee(id)
            .await?
            .ok_or(AppError::TrusteeNotFound(id))
    }

    /// Create a trustee
    pub async fn create(&self, mut data: CreateTrustee) -> AppResult<Trustee> {
        data.qr_code_value = data.qr_code_value.trim().to_string();
        data.validate()?;

        if self.store.find_trustee_by_qr_code(&data.qr_code_value).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "QR code {} is already assigned",
                data.qr_code_value
            )));
        }

        let trustee = self.store.create_trustee(&data).await?;
        tracing::info!(trustee_id = %trustee.id, gaam = %trustee.gaam, "Trustee created");
        Ok(trustee)
    }
}
