//! HTTP handlers for DocGen API

pub mod audit_logs;
pub mod auth;
pub mod documents;
pub mod employees;
pub mod templates;

use axum::Json;
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "docgen-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}
