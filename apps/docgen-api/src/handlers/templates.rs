//! Template management endpoints
//!
//! Content is validated and its variables extracted by the template
//! engine before anything is written.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use shared_types::{AuditAction, Role, Template};
use sqlx::sqlite::SqlitePool;

use crate::audit::{self, AuditEvent};
use crate::auth::{AuthUser, ClientInfo};
use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

const TEMPLATE_COLUMNS: &str = r#"
    SELECT t.id, t.name, t.content, t.variables, t.version, t.created_by,
           u.name AS created_by_name, t.created_at, t.updated_at
    FROM templates t
    LEFT JOIN users u ON u.id = t.created_by
"#;

pub(crate) async fn fetch_template(
    db: &SqlitePool,
    id: i64,
) -> Result<Option<DbTemplate>, sqlx::Error> {
    let sql = format!("{} WHERE t.id = ?", TEMPLATE_COLUMNS);
    let row = sqlx::query_as(&sql).bind(id).fetch_optional(db).await?;
    Ok(row)
}

fn template_name(req: &TemplateRequest) -> Result<&str, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidRequest(
            "Template name is required".to_string(),
        ));
    }
    Ok(name)
}

/// Handler: GET /api/templates
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Template>>>, ApiError> {
    let sql = format!("{} ORDER BY t.created_at DESC, t.id DESC", TEMPLATE_COLUMNS);
    let rows: Vec<DbTemplate> = sqlx::query_as(&sql).fetch_all(&state.db).await?;

    let templates = rows
        .into_iter()
        .map(Template::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ApiResponse::ok(templates))
}

/// Handler: GET /api/templates/:id
pub async fn get_template(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Template>>, ApiError> {
    let row = fetch_template(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    Ok(ApiResponse::ok(Template::try_from(row)?))
}

/// Handler: POST /api/templates
pub async fn create_template(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    client: ClientInfo,
    Json(req): Json<TemplateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedResponse>>), ApiError> {
    user.require(Role::can_manage_templates, "Only administrators can create templates")?;
    let name = template_name(&req)?;
    let prepared = template_engine::prepare(&req.content)?;

    let variables = serde_json::to_string(&prepared.variables)
        .map_err(|e| ApiError::Internal(e.into()))?;
    let now = db_timestamp(Utc::now());

    let result = sqlx::query(
        r#"
        INSERT INTO templates (name, content, variables, version, created_by, created_at, updated_at)
        VALUES (?, ?, ?, 1, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(&prepared.content)
    .bind(&variables)
    .bind(user.id())
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let id = result.last_insert_rowid();
    tracing::info!(
        "Created template {} '{}' with {} variables",
        id,
        name,
        prepared.variables.len()
    );

    audit::record(
        &state.db,
        &client,
        AuditEvent::new(
            AuditAction::TemplateCreated,
            user.id(),
            format!("Created template: {}", name),
        )
        .template(id),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(CreatedResponse {
            id,
            message: "Template created successfully".to_string(),
        }),
    ))
}

/// Handler: PUT /api/templates/:id
///
/// Replaces name and content and bumps the version in the same statement.
pub async fn update_template(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    client: ClientInfo,
    Path(id): Path<i64>,
    Json(req): Json<TemplateRequest>,
) -> Result<Json<ApiResponse<Template>>, ApiError> {
    user.require(Role::can_manage_templates, "Only administrators can update templates")?;
    let name = template_name(&req)?;
    let prepared = template_engine::prepare(&req.content)?;

    let variables = serde_json::to_string(&prepared.variables)
        .map_err(|e| ApiError::Internal(e.into()))?;

    let result = sqlx::query(
        r#"
        UPDATE templates
        SET name = ?, content = ?, variables = ?, version = version + 1, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(&prepared.content)
    .bind(&variables)
    .bind(db_timestamp(Utc::now()))
    .bind(id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Template not found".to_string()));
    }

    let template: Template = fetch_template(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?
        .try_into()?;
    tracing::info!("Updated template {} to version {}", id, template.version);

    audit::record(
        &state.db,
        &client,
        AuditEvent::new(
            AuditAction::TemplateUpdated,
            user.id(),
            format!("Updated template: {} (version {})", name, template.version),
        )
        .template(id),
    )
    .await;

    Ok(ApiResponse::ok(template))
}

/// Handler: DELETE /api/templates/:id
pub async fn delete_template(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    client: ClientInfo,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    user.require(Role::can_manage_templates, "Only administrators can delete templates")?;

    let row = fetch_template(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    sqlx::query("DELETE FROM templates WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;
    tracing::info!("Deleted template {} '{}'", id, row.name);

    audit::record(
        &state.db,
        &client,
        AuditEvent::new(
            AuditAction::TemplateDeleted,
            user.id(),
            format!("Deleted template: {}", row.name),
        )
        .template(id),
    )
    .await;

    Ok(ApiResponse::ok(MessageResponse {
        message: "Template deleted successfully".to_string(),
    }))
}

/// Handler: POST /api/templates/validate
pub async fn validate_template(
    _user: AuthUser,
    Json(req): Json<ValidateTemplateRequest>,
) -> Json<ApiResponse<ValidateTemplateResponse>> {
    let report = template_engine::validate(&req.content);

    ApiResponse::ok(ValidateTemplateResponse {
        is_valid: report.is_valid,
        errors: report.errors,
        variables: template_engine::extract_variables(&req.content),
    })
}

/// Handler: POST /api/templates/render
pub async fn render_template(
    _user: AuthUser,
    Json(req): Json<RenderTemplateRequest>,
) -> Json<ApiResponse<RenderTemplateResponse>> {
    let values = value_map_from_json(&req.values);

    ApiResponse::ok(RenderTemplateResponse {
        rendered: template_engine::render(&req.content, &values),
        missing_variables: template_engine::missing_variables(&req.content, &values),
    })
}
