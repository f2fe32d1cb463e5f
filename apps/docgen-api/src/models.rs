//! Data models for DocGen API

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared_types::{
    AuditLogEntry, Document, DocumentStatus, Employee, Role, Template, User,
};
use sqlx::FromRow;
use template_engine::ValueMap;

use crate::error::ApiError;

/// Timestamp text as stored in every table
pub fn db_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert submitted document data into the engine's value map.
///
/// Strings are used verbatim, numbers and booleans by their JSON text,
/// and nested values as compact JSON. `null` entries are left out so the
/// placeholder renders as the sentinel.
pub fn value_map_from_json(data: &Map<String, Value>) -> ValueMap {
    data.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}

// ============================================================
// Response envelope
// ============================================================

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> axum::Json<Self> {
        axum::Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================
// Users and authentication
// ============================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

impl From<DbUser> for User {
    fn from(row: DbUser) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            role: Role::from_label(&row.role),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// ============================================================
// Templates
// ============================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbTemplate {
    pub id: i64,
    pub name: String,
    pub content: String,
    pub variables: String,
    pub version: i64,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbTemplate> for Template {
    type Error = ApiError;

    fn try_from(row: DbTemplate) -> Result<Self, Self::Error> {
        let variables: Vec<String> =
            serde_json::from_str(&row.variables).map_err(|e| ApiError::Internal(e.into()))?;

        Ok(Template {
            id: row.id,
            name: row.name,
            content: row.content,
            variables,
            version: row.version,
            created_by: row.created_by,
            created_by_name: row.created_by_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Body of template create and update requests
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateRequest {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateTemplateRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateTemplateResponse {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderTemplateRequest {
    pub content: String,
    #[serde(default)]
    pub values: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderTemplateResponse {
    pub rendered: String,
    pub missing_variables: Vec<String>,
}

// ============================================================
// Documents
// ============================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbDocument {
    pub id: i64,
    pub template_id: i64,
    pub template_name: String,
    pub filled_data: String,
    pub status: String,
    pub created_by: i64,
    pub created_by_name: Option<String>,
    pub approved_by: Option<i64>,
    pub approved_by_name: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub digital_signature: Option<String>,
    pub export_pdf_url: Option<String>,
    pub export_docx_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbDocument {
    pub fn filled_data(&self) -> Result<Map<String, Value>, ApiError> {
        serde_json::from_str(&self.filled_data).map_err(|e| ApiError::Internal(e.into()))
    }
}

impl TryFrom<DbDocument> for Document {
    type Error = ApiError;

    fn try_from(row: DbDocument) -> Result<Self, Self::Error> {
        let filled_data = row.filled_data()?;

        Ok(Document {
            id: row.id,
            template_id: row.template_id,
            template_name: row.template_name,
            filled_data,
            status: DocumentStatus::from_label(&row.status),
            created_by: row.created_by,
            created_by_name: row.created_by_name,
            approved_by: row.approved_by,
            approved_by_name: row.approved_by_name,
            approved_at: row.approved_at,
            digital_signature: row.digital_signature,
            export_pdf_url: row.export_pdf_url,
            export_docx_url: row.export_docx_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocumentRequest {
    pub template_id: i64,
    #[serde(default)]
    pub filled_data: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub preview: String,
    pub missing_variables: Vec<String>,
    pub document: Document,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportQuery {
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "pdf".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportResponse {
    pub download_url: String,
    pub filename: String,
    pub content_type: &'static str,
}

/// Signature image sent as base64 (a `data:` URL is accepted too)
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureUploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub data_base64: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignatureResponse {
    pub signature_url: String,
    pub message: String,
}

// ============================================================
// Audit logs
// ============================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbAuditLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub document_id: Option<i64>,
    pub template_id: Option<i64>,
    pub action: String,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_role: Option<String>,
    pub document_name: Option<String>,
    pub template_name: Option<String>,
}

impl From<DbAuditLog> for AuditLogEntry {
    fn from(row: DbAuditLog) -> Self {
        AuditLogEntry {
            id: row.id,
            user_id: row.user_id,
            document_id: row.document_id,
            template_id: row.template_id,
            action: row.action,
            details: row.details,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            timestamp: row.timestamp,
            user_name: row.user_name,
            user_email: row.user_email,
            user_role: row.user_role,
            document_name: row.document_name,
            template_name: row.template_name,
        }
    }
}

/// Audit log filters as sent in the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogQuery {
    pub user_id: Option<i64>,
    pub document_id: Option<i64>,
    pub template_id: Option<i64>,
    pub action: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_records: i64,
    pub per_page: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditLogPage {
    pub logs: Vec<AuditLogEntry>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DailyActivity {
    pub date: String,
    pub activity_count: i64,
    pub unique_users: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActionCount {
    pub action: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserActivity {
    pub name: String,
    pub email: String,
    pub role: String,
    pub activity_count: i64,
    pub last_activity: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditStats {
    pub daily_activity: Vec<DailyActivity>,
    pub action_breakdown: Vec<ActionCount>,
    pub user_activity: Vec<UserActivity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditExportResponse {
    pub download_url: String,
    pub filename: String,
    pub records: usize,
}

// ============================================================
// Employees
// ============================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbEmployee {
    pub employee_id: String,
    pub name: String,
    pub email: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub manager_id: Option<String>,
    pub salary: Option<f64>,
    pub hire_date: Option<String>,
    pub status: String,
}

impl DbEmployee {
    /// Public view of the row; salary is only kept for roles allowed to see it
    pub fn into_employee(self, role: Role) -> Employee {
        Employee {
            employee_id: self.employee_id,
            name: self.name,
            email: self.email,
            designation: self.designation,
            department: self.department,
            manager_id: self.manager_id,
            salary: self.salary.filter(|_| role.can_view_salaries()),
            hire_date: self.hire_date,
            status: self.status,
            manager_name: None,
            manager_designation: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeListQuery {
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeSearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DepartmentCount {
    pub department: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DesignationCount {
    pub designation: String,
    pub count: i64,
}

/// Active headcount with its breakdowns; `recent_hires` counts the last 30 days
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeStats {
    pub total_employees: i64,
    pub recent_hires: i64,
    pub department_breakdown: Vec<DepartmentCount>,
    pub designation_breakdown: Vec<DesignationCount>,
}
