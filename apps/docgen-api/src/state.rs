//! Application state for DocGen API

use anyhow::Result;
use shared_types::Role;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::Config;
use crate::storage::Storage;
use crate::users;

pub struct AppState {
    pub db: SqlitePool,
    pub storage: Storage,
    pub token_ttl_secs: i64,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self> {
        let db_url = config.database_url();
        tracing::info!("Connecting to database: {}", db_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&db_url)
            .await?;

        run_migrations(&pool).await?;

        if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
            ensure_admin(&pool, &config.admin_name, email, password).await?;
        }

        let storage = Storage::new(&config.storage_dir).await?;
        tracing::info!("Storing files under {}", storage.root().display());

        Ok(Self {
            db: pool,
            storage,
            token_ttl_secs: config.token_ttl_secs,
        })
    }
}

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'Viewer',
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS templates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        content TEXT NOT NULL,
        variables TEXT NOT NULL DEFAULT '[]',
        version INTEGER NOT NULL DEFAULT 1,
        created_by INTEGER REFERENCES users(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        template_id INTEGER NOT NULL,
        template_name TEXT NOT NULL,
        filled_data TEXT NOT NULL DEFAULT '{}',
        status TEXT NOT NULL DEFAULT 'pending',
        created_by INTEGER NOT NULL REFERENCES users(id),
        approved_by INTEGER REFERENCES users(id),
        approved_at TEXT,
        digital_signature TEXT,
        export_pdf_url TEXT,
        export_docx_url TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS employees (
        employee_id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT,
        designation TEXT,
        department TEXT,
        manager_id TEXT REFERENCES employees(employee_id),
        salary REAL,
        hire_date TEXT,
        status TEXT NOT NULL DEFAULT 'active'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER REFERENCES users(id),
        document_id INTEGER,
        template_id INTEGER,
        action TEXT NOT NULL,
        details TEXT,
        ip_address TEXT,
        user_agent TEXT,
        timestamp TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_documents_created_by ON documents(created_by)",
    "CREATE INDEX IF NOT EXISTS idx_employees_department ON employees(department)",
    "CREATE INDEX IF NOT EXISTS idx_audit_logs_timestamp ON audit_logs(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_audit_logs_user ON audit_logs(user_id)",
];

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Running database migrations...");

    for statement in MIGRATIONS {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Migrations complete");
    Ok(())
}

async fn ensure_admin(pool: &SqlitePool, name: &str, email: &str, password: &str) -> Result<()> {
    if users::find_user_by_email(pool, email).await?.is_some() {
        return Ok(());
    }

    let id = users::create_user(pool, name, email, password, Role::Admin).await?;
    tracing::info!("Created admin account {} (id {})", email, id);
    Ok(())
}
