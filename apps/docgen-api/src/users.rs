//! User account queries

use chrono::Utc;
use shared_types::Role;
use sqlx::sqlite::SqlitePool;

use crate::auth::hash_password;
use crate::models::{db_timestamp, DbUser};

const USER_COLUMNS: &str = "SELECT id, name, email, password_hash, role FROM users";

pub async fn create_user(
    db: &SqlitePool,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password_hash, role, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(hash_password(password))
    .bind(role.as_str())
    .bind(db_timestamp(Utc::now()))
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn find_user(db: &SqlitePool, id: i64) -> Result<Option<DbUser>, sqlx::Error> {
    let sql = format!("{} WHERE id = ?", USER_COLUMNS);
    let user = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn find_user_by_email(
    db: &SqlitePool,
    email: &str,
) -> Result<Option<DbUser>, sqlx::Error> {
    let sql = format!("{} WHERE email = ?", USER_COLUMNS);
    let user = sqlx::query_as(&sql)
        .bind(email)
        .fetch_optional(db)
        .await?;
    Ok(user)
}
