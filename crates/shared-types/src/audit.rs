//! Audit trail vocabulary for document and template events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of auditable events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    TemplateCreated,
    TemplateUpdated,
    TemplateDeleted,
    DocumentCreated,
    DocumentExported,
    DocumentApproved,
    SignatureUploaded,
    AuditLogsExported,
    UserLogin,
}

impl AuditAction {
    /// Label persisted in the audit log and matched by the action filter
    pub fn label(&self) -> &'static str {
        match self {
            AuditAction::TemplateCreated => "Template Created",
            AuditAction::TemplateUpdated => "Template Updated",
            AuditAction::TemplateDeleted => "Template Deleted",
            AuditAction::DocumentCreated => "Document Created",
            AuditAction::DocumentExported => "Document Exported",
            AuditAction::DocumentApproved => "Document Approved",
            AuditAction::SignatureUploaded => "Signature Uploaded",
            AuditAction::AuditLogsExported => "Audit Logs Exported",
            AuditAction::UserLogin => "User Login",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single audit log entry with the names of the records it touches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
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

/// Column headings of the CSV export
pub const CSV_HEADER: [&str; 10] = [
    "ID",
    "User",
    "Email",
    "Role",
    "Action",
    "Details",
    "Document",
    "Template",
    "IP Address",
    "Timestamp",
];

impl AuditLogEntry {
    /// Fields in [`CSV_HEADER`] order. Missing values are empty strings.
    pub fn csv_record(&self) -> [String; 10] {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        [
            self.id.to_string(),
            text(&self.user_name),
            text(&self.user_email),
            text(&self.user_role),
            self.action.clone(),
            text(&self.details),
            text(&self.document_name),
            text(&self.template_name),
            text(&self.ip_address),
            self.timestamp.to_rfc3339(),
        ]
    }
}
