//! Audit trail recording
//!
//! Writing an entry never fails the request that triggered it.

use chrono::Utc;
use shared_types::AuditAction;
use sqlx::sqlite::SqlitePool;

use crate::auth::ClientInfo;
use crate::models::db_timestamp;

/// An action about to be written to `audit_logs`
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub user_id: i64,
    pub details: String,
    pub document_id: Option<i64>,
    pub template_id: Option<i64>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, user_id: i64, details: impl Into<String>) -> Self {
        Self {
            action,
            user_id,
            details: details.into(),
            document_id: None,
            template_id: None,
        }
    }

    pub fn document(mut self, id: i64) -> Self {
        self.document_id = Some(id);
        self
    }

    pub fn template(mut self, id: i64) -> Self {
        self.template_id = Some(id);
        self
    }
}

pub async fn record(db: &SqlitePool, client: &ClientInfo, event: AuditEvent) {
    let result = sqlx::query(
        r#"
        INSERT INTO audit_logs
            (user_id, document_id, template_id, action, details, ip_address, user_agent, timestamp)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(event.user_id)
    .bind(event.document_id)
    .bind(event.template_id)
    .bind(event.action.label())
    .bind(&event.details)
    .bind(&client.ip_address)
    .bind(&client.user_agent)
    .bind(db_timestamp(Utc::now()))
    .execute(db)
    .await;

    if let Err(e) = result {
        tracing::warn!("Failed to record audit event {}: {}", event.action, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = AuditEvent::new(AuditAction::DocumentExported, 3, "Exported as PDF")
            .document(9)
            .template(2);

        assert_eq!(event.user_id, 3);
        assert_eq!(event.document_id, Some(9));
        assert_eq!(event.template_id, Some(2));
        assert_eq!(event.action.label(), "Document Exported");
    }
}
