//! Document assembly endpoints
//!
//! A document is a template id plus the values a user filled in. Preview
//! and export both run the stored template content through the engine.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{Datelike, NaiveDate, Utc};
use rand::Rng;
use serde_json::{Map, Value};
use shared_types::{AuditAction, Document, DocumentStatus, ExportFormat, Role};
use sqlx::sqlite::SqlitePool;

use crate::audit::{self, AuditEvent};
use crate::auth::{AuthUser, ClientInfo};
use crate::error::ApiError;
use crate::handlers::templates::fetch_template;
use crate::models::*;
use crate::state::AppState;

/// Largest accepted signature image, after base64 decoding
pub const MAX_SIGNATURE_BYTES: usize = 5 * 1024 * 1024;

const DOCUMENT_COLUMNS: &str = r#"
    SELECT d.id, d.template_id, d.template_name, d.filled_data, d.status,
           d.created_by, c.name AS created_by_name,
           d.approved_by, a.name AS approved_by_name, d.approved_at,
           d.digital_signature, d.export_pdf_url, d.export_docx_url,
           d.created_at, d.updated_at
    FROM documents d
    LEFT JOIN users c ON c.id = d.created_by
    LEFT JOIN users a ON a.id = d.approved_by
"#;

fn not_visible() -> ApiError {
    ApiError::NotFound("Document not found or access denied".to_string())
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Fill in `order_number` and `date` when the user left them blank
fn apply_defaults(data: &mut Map<String, Value>, today: NaiveDate, sequence: u32) {
    if is_blank(data.get("order_number")) {
        data.insert(
            "order_number".to_string(),
            Value::String(format!("ORD-{}-{:04}", today.year(), sequence)),
        );
    }
    if is_blank(data.get("date")) {
        data.insert(
            "date".to_string(),
            Value::String(today.format("%Y-%m-%d").to_string()),
        );
    }
}

/// Load a document the caller may see; others' documents look missing
async fn fetch_visible_document(
    db: &SqlitePool,
    user: &AuthUser,
    id: i64,
) -> Result<DbDocument, ApiError> {
    let row: Option<DbDocument> = if user.role().can_view_all_documents() {
        let sql = format!("{} WHERE d.id = ?", DOCUMENT_COLUMNS);
        sqlx::query_as(&sql).bind(id).fetch_optional(db).await?
    } else {
        let sql = format!("{} WHERE d.id = ? AND d.created_by = ?", DOCUMENT_COLUMNS);
        sqlx::query_as(&sql)
            .bind(id)
            .bind(user.id())
            .fetch_optional(db)
            .await?
    };

    row.ok_or_else(not_visible)
}

/// Render a document against its template's current content
async fn render_document(
    db: &SqlitePool,
    row: &DbDocument,
) -> Result<(String, Vec<String>), ApiError> {
    let template = fetch_template(db, row.template_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    let values = value_map_from_json(&row.filled_data()?);
    Ok((
        template_engine::render(&template.content, &values),
        template_engine::missing_variables(&template.content, &values),
    ))
}

/// Handler: GET /api/documents
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Document>>>, ApiError> {
    let rows: Vec<DbDocument> = if user.role().can_view_all_documents() {
        let sql = format!("{} ORDER BY d.created_at DESC, d.id DESC", DOCUMENT_COLUMNS);
        sqlx::query_as(&sql).fetch_all(&state.db).await?
    } else {
        let sql = format!(
            "{} WHERE d.created_by = ? ORDER BY d.created_at DESC, d.id DESC",
            DOCUMENT_COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(user.id())
            .fetch_all(&state.db)
            .await?
    };

    let documents = rows
        .into_iter()
        .map(Document::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ApiResponse::ok(documents))
}

/// Handler: GET /api/documents/:id
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Document>>, ApiError> {
    let row = fetch_visible_document(&state.db, &user, id).await?;
    Ok(ApiResponse::ok(Document::try_from(row)?))
}

/// Handler: POST /api/documents
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    client: ClientInfo,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedResponse>>), ApiError> {
    user.require(
        Role::can_create_documents,
        "Only administrators and encoders can create documents",
    )?;

    let sequence = rand::thread_rng().gen_range(0..10_000);
    let mut filled_data = req.filled_data;
    apply_defaults(&mut filled_data, Utc::now().date_naive(), sequence);

    let template = fetch_template(&state.db, req.template_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    let data = serde_json::to_string(&filled_data).map_err(|e| ApiError::Internal(e.into()))?;
    let now = db_timestamp(Utc::now());

    let result = sqlx::query(
        r#"
        INSERT INTO documents (template_id, template_name, filled_data, status, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(template.id)
    .bind(&template.name)
    .bind(&data)
    .bind(DocumentStatus::Pending.as_str())
    .bind(user.id())
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let id = result.last_insert_rowid();
    tracing::info!("Created document {} from template {}", id, template.id);

    audit::record(
        &state.db,
        &client,
        AuditEvent::new(
            AuditAction::DocumentCreated,
            user.id(),
            format!("Created document from template: {}", template.name),
        )
        .document(id)
        .template(template.id),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(CreatedResponse {
            id,
            message: "Document created successfully".to_string(),
        }),
    ))
}

/// Handler: GET /api/documents/:id/preview
pub async fn preview_document(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PreviewResponse>>, ApiError> {
    let row = fetch_visible_document(&state.db, &user, id).await?;
    let (preview, missing_variables) = render_document(&state.db, &row).await?;

    Ok(ApiResponse::ok(PreviewResponse {
        preview,
        missing_variables,
        document: row.try_into()?,
    }))
}

/// Handler: POST /api/documents/:id/export?format=pdf|docx
///
/// The file body is the rendered text.
pub async fn export_document(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    client: ClientInfo,
    Path(id): Path<i64>,
    Query(query): Query<ExportQuery>,
) -> Result<Json<ApiResponse<ExportResponse>>, ApiError> {
    let format: ExportFormat = query
        .format
        .parse()
        .map_err(|_| ApiError::InvalidRequest("Invalid export format".to_string()))?;

    let row = fetch_visible_document(&state.db, &user, id).await?;
    let (rendered, _) = render_document(&state.db, &row).await?;

    let stored = state
        .storage
        .write_export(&row.template_name, format.extension(), rendered.as_bytes())
        .await?;

    let column = match format {
        ExportFormat::Pdf => "export_pdf_url",
        ExportFormat::Docx => "export_docx_url",
    };
    let sql = format!(
        "UPDATE documents SET {} = ?, updated_at = ? WHERE id = ?",
        column
    );
    sqlx::query(&sql)
        .bind(&stored.url)
        .bind(db_timestamp(Utc::now()))
        .bind(id)
        .execute(&state.db)
        .await?;

    tracing::info!("Exported document {} to {}", id, stored.url);

    audit::record(
        &state.db,
        &client,
        AuditEvent::new(
            AuditAction::DocumentExported,
            user.id(),
            format!("Exported as {}", format.extension().to_uppercase()),
        )
        .document(id)
        .template(row.template_id),
    )
    .await;

    Ok(ApiResponse::ok(ExportResponse {
        download_url: stored.url,
        filename: stored.filename,
        content_type: format.mime_type(),
    }))
}

fn signature_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Decode base64 image data, accepting a `data:<type>;base64,` prefix
fn decode_image_data(data: &str) -> Result<Vec<u8>, ApiError> {
    let payload = match data.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or(rest, |(_, body)| body),
        None => data,
    };

    BASE64
        .decode(payload.trim())
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid signature base64: {}", e)))
}

/// Handler: POST /api/documents/:id/signature
pub async fn upload_signature(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    client: ClientInfo,
    Path(id): Path<i64>,
    Json(req): Json<SignatureUploadRequest>,
) -> Result<Json<ApiResponse<SignatureResponse>>, ApiError> {
    let extension = signature_extension(req.content_type.trim()).ok_or_else(|| {
        ApiError::InvalidRequest("Only JPEG, PNG and GIF images are allowed".to_string())
    })?;

    let bytes = decode_image_data(&req.data_base64)?;
    if bytes.is_empty() {
        return Err(ApiError::InvalidRequest("Signature image is empty".to_string()));
    }
    if bytes.len() > MAX_SIGNATURE_BYTES {
        return Err(ApiError::InvalidRequest(
            "Signature image exceeds the 5 MB limit".to_string(),
        ));
    }

    let row = fetch_visible_document(&state.db, &user, id).await?;
    let stored = state.storage.write_signature(row.id, extension, &bytes).await?;

    sqlx::query("UPDATE documents SET digital_signature = ?, updated_at = ? WHERE id = ?")
        .bind(&stored.url)
        .bind(db_timestamp(Utc::now()))
        .bind(id)
        .execute(&state.db)
        .await?;

    tracing::info!("Stored signature for document {} at {}", id, stored.url);

    audit::record(
        &state.db,
        &client,
        AuditEvent::new(
            AuditAction::SignatureUploaded,
            user.id(),
            format!("Uploaded signature: {}", req.file_name),
        )
        .document(id),
    )
    .await;

    Ok(ApiResponse::ok(SignatureResponse {
        signature_url: stored.url,
        message: "Signature uploaded successfully".to_string(),
    }))
}

/// Handler: POST /api/documents/:id/approve
pub async fn approve_document(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    client: ClientInfo,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Document>>, ApiError> {
    user.require(
        Role::can_approve_documents,
        "Only administrators and approvers can approve documents",
    )?;

    let row = fetch_visible_document(&state.db, &user, id).await?;
    let now = db_timestamp(Utc::now());

    let result = sqlx::query(
        r#"
        UPDATE documents
        SET status = ?, approved_by = ?, approved_at = ?, updated_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(DocumentStatus::Approved.as_str())
    .bind(user.id())
    .bind(&now)
    .bind(&now)
    .bind(id)
    .bind(DocumentStatus::Pending.as_str())
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::InvalidRequest(
            "Document is already approved".to_string(),
        ));
    }

    tracing::info!("Document {} approved by user {}", id, user.id());

    audit::record(
        &state.db,
        &client,
        AuditEvent::new(
            AuditAction::DocumentApproved,
            user.id(),
            format!("Approved document from template: {}", row.template_name),
        )
        .document(id)
        .template(row.template_id),
    )
    .await;

    let row = fetch_visible_document(&state.db, &user, id).await?;
    Ok(ApiResponse::ok(Document::try_from(row)?))
}
