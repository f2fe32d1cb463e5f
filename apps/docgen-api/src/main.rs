//! DocGen API Server - Backend for office document generation
//!
//! Provides REST endpoints for:
//! - Template management (validated `{{variable}}` templates)
//! - Document assembly, preview, export and approval
//! - Audit trail queries and CSV export
//! - Read-only employee directory

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod audit;
mod auth;
mod config;
mod error;
mod handlers;
mod models;
mod state;
mod storage;
mod users;


use config::Config;
use state::AppState;

/// Request body limit; fits a base64-encoded signature image at the size cap
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Build the router with every route and middleware layer
pub fn app(state: Arc<AppState>) -> Router {
    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let uploads = ServeDir::new(state.storage.root());

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Authentication
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/me", get(handlers::auth::me))
        // Templates
        .route(
            "/api/templates",
            get(handlers::templates::list_templates).post(handlers::templates::create_template),
        )
        .route(
            "/api/templates/validate",
            post(handlers::templates::validate_template),
        )
        .route(
            "/api/templates/render",
            post(handlers::templates::render_template),
        )
        .route(
            "/api/templates/:id",
            get(handlers::templates::get_template)
                .put(handlers::templates::update_template)
                .delete(handlers::templates::delete_template),
        )
        // Documents
        .route(
            "/api/documents",
            get(handlers::documents::list_documents).post(handlers::documents::create_document),
        )
        .route("/api/documents/:id", get(handlers::documents::get_document))
        .route(
            "/api/documents/:id/preview",
            get(handlers::documents::preview_document),
        )
        .route(
            "/api/documents/:id/export",
            post(handlers::documents::export_document),
        )
        .route(
            "/api/documents/:id/signature",
            post(handlers::documents::upload_signature),
        )
        .route(
            "/api/documents/:id/approve",
            post(handlers::documents::approve_document),
        )
        // Audit trail
        .route("/api/audit-logs", get(handlers::audit_logs::list_audit_logs))
        .route("/api/audit-logs/stats", get(handlers::audit_logs::audit_stats))
        .route(
            "/api/audit-logs/export",
            post(handlers::audit_logs::export_audit_logs),
        )
        // Employee directory
        .route("/api/employees", get(handlers::employees::list_employees))
        .route(
            "/api/employees/search",
            get(handlers::employees::search_employees),
        )
        .route(
            "/api/employees/departments",
            get(handlers::employees::list_departments),
        )
        .route(
            "/api/employees/designations",
            get(handlers::employees::list_designations),
        )
        .route("/api/employees/stats", get(handlers::employees::employee_stats))
        .route(
            "/api/employees/:employee_id",
            get(handlers::employees::get_employee),
        )
        // Exported documents and signature images
        .nest_service("/uploads", uploads)
        // Add middleware
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();
    let config = Config::parse();

    let level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive(format!("docgen_api={}", level).parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Initializing DocGen API...");
    let state = Arc::new(AppState::new(&config).await?);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting DocGen API on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
