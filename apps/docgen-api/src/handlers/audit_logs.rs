//! Audit trail queries, statistics and CSV export

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use shared_types::{AuditAction, AuditLogEntry, Role, CSV_HEADER};
use sqlx::{QueryBuilder, Sqlite};

use crate::audit::{self, AuditEvent};
use crate::auth::{AuthUser, ClientInfo};
use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 500;
/// Highest page number served; larger requests land on this page
pub const MAX_PAGE: i64 = 1_000_000;
const STATS_WINDOW_DAYS: i64 = 30;

const LOG_COLUMNS: &str = r#"
    SELECT al.id, al.user_id, al.document_id, al.template_id, al.action, al.details,
           al.ip_address, al.user_agent, al.timestamp,
           u.name AS user_name, u.email AS user_email, u.role AS user_role,
           d.template_name AS document_name, t.name AS template_name
    FROM audit_logs al
    LEFT JOIN users u ON u.id = al.user_id
    LEFT JOIN documents d ON d.id = al.document_id
    LEFT JOIN templates t ON t.id = al.template_id
"#;

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ApiError::InvalidRequest(format!("Invalid {}, expected YYYY-MM-DD", field))
    })
}

/// Start a query over `audit_logs al` with every filter in `query` applied
fn filtered(select: &str, query: &AuditLogQuery) -> Result<QueryBuilder<'static, Sqlite>, ApiError> {
    let mut builder = QueryBuilder::new(select);
    builder.push(" WHERE 1 = 1");

    if let Some(user_id) = query.user_id {
        builder.push(" AND al.user_id = ").push_bind(user_id);
    }
    if let Some(document_id) = query.document_id {
        builder.push(" AND al.document_id = ").push_bind(document_id);
    }
    if let Some(template_id) = query.template_id {
        builder.push(" AND al.template_id = ").push_bind(template_id);
    }
    if let Some(action) = non_empty(&query.action) {
        builder
            .push(" AND al.action LIKE ")
            .push_bind(format!("%{}%", action));
    }
    if let Some(from) = non_empty(&query.date_from) {
        let from = parse_date(from, "date_from")?;
        builder
            .push(" AND substr(al.timestamp, 1, 10) >= ")
            .push_bind(from.format("%Y-%m-%d").to_string());
    }
    if let Some(to) = non_empty(&query.date_to) {
        let to = parse_date(to, "date_to")?;
        builder
            .push(" AND substr(al.timestamp, 1, 10) <= ")
            .push_bind(to.format("%Y-%m-%d").to_string());
    }

    Ok(builder)
}

/// Resolve `(page, per_page)` from the query, clamped to sane bounds
fn page_bounds(query: &AuditLogQuery) -> (i64, i64) {
    let page = query.page.unwrap_or(1).clamp(1, MAX_PAGE);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

fn total_pages(total_records: i64, per_page: i64) -> i64 {
    (total_records + per_page - 1) / per_page
}

/// Handler: GET /api/audit-logs
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<ApiResponse<AuditLogPage>>, ApiError> {
    user.require(Role::can_view_audit_logs, "Insufficient permissions to view audit logs")?;
    let (page, per_page) = page_bounds(&query);

    let total_records: i64 = filtered("SELECT COUNT(*) FROM audit_logs al", &query)?
        .build_query_scalar()
        .fetch_one(&state.db)
        .await?;

    let mut builder = filtered(LOG_COLUMNS, &query)?;
    builder
        .push(" ORDER BY al.timestamp DESC, al.id DESC LIMIT ")
        .push_bind(per_page)
        .push(" OFFSET ")
        .push_bind((page - 1) * per_page);
    let rows: Vec<DbAuditLog> = builder.build_query_as().fetch_all(&state.db).await?;

    Ok(ApiResponse::ok(AuditLogPage {
        logs: rows.into_iter().map(AuditLogEntry::from).collect(),
        pagination: Pagination {
            current_page: page,
            total_pages: total_pages(total_records, per_page),
            total_records,
            per_page,
        },
    }))
}

/// Handler: GET /api/audit-logs/stats
pub async fn audit_stats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<AuditStats>>, ApiError> {
    user.require(Role::can_view_audit_logs, "Insufficient permissions to view audit statistics")?;

    let since = (Utc::now() - Duration::days(STATS_WINDOW_DAYS))
        .format("%Y-%m-%d")
        .to_string();

    let daily_activity: Vec<DailyActivity> = sqlx::query_as(
        r#"
        SELECT substr(timestamp, 1, 10) AS date,
               COUNT(*) AS activity_count,
               COUNT(DISTINCT user_id) AS unique_users
        FROM audit_logs
        WHERE substr(timestamp, 1, 10) >= ?
        GROUP BY substr(timestamp, 1, 10)
        ORDER BY date DESC
        "#,
    )
    .bind(&since)
    .fetch_all(&state.db)
    .await?;

    let action_breakdown: Vec<ActionCount> = sqlx::query_as(
        r#"
        SELECT action, COUNT(*) AS count
        FROM audit_logs
        WHERE substr(timestamp, 1, 10) >= ?
        GROUP BY action
        ORDER BY count DESC, action
        "#,
    )
    .bind(&since)
    .fetch_all(&state.db)
    .await?;

    let user_activity: Vec<UserActivity> = sqlx::query_as(
        r#"
        SELECT u.name, u.email, u.role,
               COUNT(al.id) AS activity_count,
               MAX(al.timestamp) AS last_activity
        FROM users u
        LEFT JOIN audit_logs al
               ON al.user_id = u.id AND substr(al.timestamp, 1, 10) >= ?
        GROUP BY u.id, u.name, u.email, u.role
        ORDER BY activity_count DESC, u.name
        "#,
    )
    .bind(&since)
    .fetch_all(&state.db)
    .await?;

    Ok(ApiResponse::ok(AuditStats {
        daily_activity,
        action_breakdown,
        user_activity,
    }))
}

fn write_csv(entries: &[AuditLogEntry]) -> Result<Vec<u8>, ApiError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .map_err(|e| ApiError::Internal(e.into()))?;
    for entry in entries {
        writer
            .write_record(entry.csv_record())
            .map_err(|e| ApiError::Internal(e.into()))?;
    }

    writer
        .into_inner()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("CSV export failed: {}", e.error())))
}

/// Handler: POST /api/audit-logs/export
///
/// Writes every matching entry; `page` and `limit` are ignored.
pub async fn export_audit_logs(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    client: ClientInfo,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<ApiResponse<AuditExportResponse>>, ApiError> {
    user.require(Role::can_export_audit_logs, "Only administrators can export audit logs")?;

    let mut builder = filtered(LOG_COLUMNS, &query)?;
    builder.push(" ORDER BY al.timestamp DESC, al.id DESC");
    let rows: Vec<DbAuditLog> = builder.build_query_as().fetch_all(&state.db).await?;
    let entries: Vec<AuditLogEntry> = rows.into_iter().map(AuditLogEntry::from).collect();

    let bytes = write_csv(&entries)?;
    let stored = state.storage.write_export("audit_logs", "csv", &bytes).await?;
    tracing::info!("Exported {} audit log entries to {}", entries.len(), stored.url);

    audit::record(
        &state.db,
        &client,
        AuditEvent::new(
            AuditAction::AuditLogsExported,
            user.id(),
            format!("Exported {} audit log records", entries.len()),
        ),
    )
    .await;

    Ok(ApiResponse::ok(AuditExportResponse {
        download_url: stored.url,
        filename: stored.filename,
        records: entries.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_page_bounds() {
        let mut query = AuditLogQuery::default();
        assert_eq!(page_bounds(&query), (1, DEFAULT_PAGE_SIZE));

        query.page = Some(0);
        query.limit = Some(10_000);
        assert_eq!(page_bounds(&query), (1, MAX_PAGE_SIZE));

        query.page = Some(3);
        query.limit = Some(-4);
        assert_eq!(page_bounds(&query), (3, 1));

        query.page = Some(i64::MAX);
        query.limit = Some(MAX_PAGE_SIZE);
        let (page, per_page) = page_bounds(&query);
        assert_eq!(page, MAX_PAGE);
        assert!((page - 1).checked_mul(per_page).is_some());
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 50), 0);
        assert_eq!(total_pages(50, 50), 1);
        assert_eq!(total_pages(51, 50), 2);
    }

    #[test]
    fn test_invalid_date_filter() {
        let query = AuditLogQuery {
            date_from: Some("07/03/2024".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            filtered(LOG_COLUMNS, &query),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_blank_filters_are_ignored() {
        let query = AuditLogQuery {
            action: Some("  ".to_string()),
            date_to: Some(String::new()),
            ..Default::default()
        };
        let builder = filtered("SELECT COUNT(*) FROM audit_logs al", &query).unwrap();
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM audit_logs al WHERE 1 = 1");
    }

    #[test]
    fn test_csv_output() {
        let entry = AuditLogEntry {
            id: 1,
            user_id: Some(2),
            document_id: None,
            template_id: Some(3),
            action: "Template Created".to_string(),
            details: Some("Created template: Leave, annual".to_string()),
            ip_address: Some("10.0.0.1".to_string()),
            user_agent: None,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 7, 9, 30, 0).unwrap(),
            user_name: Some("Ada".to_string()),
            user_email: Some("ada@example.com".to_string()),
            user_role: Some("Admin".to_string()),
            document_name: None,
            template_name: Some("Leave".to_string()),
        };

        let csv = String::from_utf8(write_csv(&[entry]).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("ID,User,Email,Role,Action,Details,Document,Template,IP Address,Timestamp")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,Ada,ada@example.com,Admin,Template Created,"));
        assert!(row.contains("\"Created template: Leave, annual\""));
        assert_eq!(lines.next(), None);
    }
}
