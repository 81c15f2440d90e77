//! HTTP client for the check-in API, used by the kiosk binary

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    api::SCANNED_BY_HEADER,
    config::KioskConfig,
    error::ErrorResponse,
    kiosk::CheckInValidator,
    models::{CheckInOutcome, CheckInRequest, CheckInResponse, RecentScan, ScanLogEntry},
};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("malformed check-in response")]
    MalformedResponse,
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &KioskConfig) -> ClientResult<Self> {
        Self::new(&config.server_url, Duration::from_secs(config.request_timeout_secs))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Submit a scanned code
    pub async fn check_in(&self, qr_code: &str, scanned_by: Option<&str>) -> ClientResult<CheckInOutcome> {
        let mut request = self.http.post(self.url("/checkin")).json(&CheckInRequest {
            qr_code: qr_code.to_string(),
        });
        if let Some(operator) = scanned_by {
            request = request.header(SCANNED_BY_HEADER, operator);
        }

        let body: CheckInResponse = parse(request.send().await?).await?;
        body.into_outcome().ok_or(ClientError::MalformedResponse)
    }

    pub async fn recent_scans(&self, trustee_id: Uuid, limit: i64) -> ClientResult<Vec<RecentScan>> {
        let response = self
            .http
            .get(self.url(&format!("/trustees/{}/scans", trustee_id)))
            .query(&[("limit", limit)])
            .send()
            .await?;
        parse(response).await
    }

    /// Every scan log row, newest first
    pub async fn scan_logs(&self) -> ClientResult<Vec<ScanLogEntry>> {
        let response = self.http.get(self.url("/scan-logs")).send().await?;
        parse(response).await
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.message)
        .unwrap_or(text);
    Err(ClientError::Api { status, message })
}

#[async_trait]
impl CheckInValidator for ApiClient {
    async fn validate(&self, qr_code: &str, scanned_by: Option<&str>) -> anyhow::Result<CheckInOutcome> {
        Ok(self.check_in(qr_code, scanned_by).await?)
    }

    async fn recent_scans(&self, trustee_id: Uuid, limit: i64) -> anyhow::Result<Vec<RecentScan>> {
        Ok(ApiClient::recent_scans(self, trustee_id, limit).await?)
    }
}
