//! Read-only employee directory

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Duration, Utc};
use shared_types::{Employee, Role};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

const MAX_SEARCH_RESULTS: i64 = 20;
const RECENT_HIRE_DAYS: i64 = 30;

const EMPLOYEE_COLUMNS: &str = r#"
    SELECT employee_id, name, email, designation, department, manager_id,
           salary, hire_date, status
    FROM employees
"#;

/// Handler: GET /api/employees
pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<EmployeeListQuery>,
) -> Result<Json<ApiResponse<Vec<Employee>>>, ApiError> {
    let department = query
        .department
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let rows: Vec<DbEmployee> = match department {
        Some(department) => {
            let sql = format!(
                "{} WHERE status = 'active' AND department = ? ORDER BY name",
                EMPLOYEE_COLUMNS
            );
            sqlx::query_as(&sql)
                .bind(department)
                .fetch_all(&state.db)
                .await?
        }
        None => {
            let sql = format!("{} WHERE status = 'active' ORDER BY name", EMPLOYEE_COLUMNS);
            sqlx::query_as(&sql).fetch_all(&state.db).await?
        }
    };

    let role = user.role();
    Ok(ApiResponse::ok(
        rows.into_iter().map(|row| row.into_employee(role)).collect(),
    ))
}

/// Handler: GET /api/employees/search?q=
pub async fn search_employees(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<EmployeeSearchQuery>,
) -> Result<Json<ApiResponse<Vec<Employee>>>, ApiError> {
    let term = query.q.trim();
    if term.is_empty() {
        return Ok(ApiResponse::ok(Vec::new()));
    }

    let pattern = format!("%{}%", term);
    let sql = format!(
        r#"{} WHERE status = 'active'
            AND (name LIKE ?1 OR employee_id LIKE ?1 OR email LIKE ?1
                 OR designation LIKE ?1 OR department LIKE ?1)
            ORDER BY name
            LIMIT ?2"#,
        EMPLOYEE_COLUMNS
    );
    let rows: Vec<DbEmployee> = sqlx::query_as(&sql)
        .bind(&pattern)
        .bind(MAX_SEARCH_RESULTS)
        .fetch_all(&state.db)
        .await?;

    let role = user.role();
    Ok(ApiResponse::ok(
        rows.into_iter().map(|row| row.into_employee(role)).collect(),
    ))
}

/// Handler: GET /api/employees/departments
pub async fn list_departments(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let departments: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT department FROM employees
        WHERE status = 'active' AND department IS NOT NULL AND department != ''
        ORDER BY department
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(ApiResponse::ok(departments))
}

/// Handler: GET /api/employees/designations
pub async fn list_designations(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let designations: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT designation FROM employees
        WHERE status = 'active' AND designation IS NOT NULL AND designation != ''
        ORDER BY designation
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(ApiResponse::ok(designations))
}

/// Handler: GET /api/employees/stats
pub async fn employee_stats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<EmployeeStats>>, ApiError> {
    user.require(
        Role::can_view_employee_stats,
        "Insufficient permissions to view employee statistics",
    )?;

    let total_employees: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE status = 'active'")
            .fetch_one(&state.db)
            .await?;

    let department_breakdown: Vec<DepartmentCount> = sqlx::query_as(
        r#"
        SELECT department, COUNT(*) AS count
        FROM employees
        WHERE status = 'active' AND department IS NOT NULL AND department != ''
        GROUP BY department
        ORDER BY count DESC, department
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let designation_breakdown: Vec<DesignationCount> = sqlx::query_as(
        r#"
        SELECT designation, COUNT(*) AS count
        FROM employees
        WHERE status = 'active' AND designation IS NOT NULL AND designation != ''
        GROUP BY designation
        ORDER BY count DESC, designation
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let since = (Utc::now() - Duration::days(RECENT_HIRE_DAYS))
        .format("%Y-%m-%d")
        .to_string();
    let recent_hires: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM employees
        WHERE status = 'active' AND substr(hire_date, 1, 10) >= ?
        "#,
    )
    .bind(&since)
    .fetch_one(&state.db)
    .await?;

    Ok(ApiResponse::ok(EmployeeStats {
        total_employees,
        recent_hires,
        department_breakdown,
        designation_breakdown,
    }))
}

/// Handler: GET /api/employees/:employee_id
pub async fn get_employee(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(employee_id): Path<String>,
) -> Result<Json<ApiResponse<Employee>>, ApiError> {
    let sql = format!(
        "{} WHERE employee_id = ? AND status = 'active'",
        EMPLOYEE_COLUMNS
    );
    let row: DbEmployee = sqlx::query_as(&sql)
        .bind(&employee_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))?;

    let manager: Option<(String, Option<String>)> = match &row.manager_id {
        Some(manager_id) => {
            sqlx::query_as("SELECT name, designation FROM employees WHERE employee_id = ?")
                .bind(manager_id)
                .fetch_optional(&state.db)
                .await?
        }
        None => None,
    };

    let mut employee = row.into_employee(user.role());
    if let Some((name, designation)) = manager {
        employee.manager_name = Some(name);
        employee.manager_designation = designation;
    }

    Ok(ApiResponse::ok(employee))
}
