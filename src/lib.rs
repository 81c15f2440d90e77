//! Trustee Check-In
//!
//! QR check-in for trustees with a per-person daily quota: a REST server
//! owning the record store, the kiosk scanner session that drives a decoder
//! device, and the admin scan log browser with CSV export.

use std::sync::Arc;

pub mod admin;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod kiosk;
pub mod logging;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
