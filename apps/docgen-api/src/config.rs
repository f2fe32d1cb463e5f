//! Runtime configuration for the DocGen API

use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments, each with an environment fallback
#[derive(Parser, Debug, Clone)]
#[command(name = "docgen-api")]
#[command(about = "Office document generation API: templates, documents and audit trail")]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// SQLite connection string; defaults to a file in the user data directory
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value = "5")]
    pub max_connections: u32,

    /// Directory for exported documents and uploaded signatures
    #[arg(long, env = "STORAGE_DIR", default_value = "uploads")]
    pub storage_dir: PathBuf,

    /// Bearer token lifetime in seconds
    #[arg(long, env = "TOKEN_TTL_SECS", default_value = "86400")]
    pub token_ttl_secs: i64,

    /// Email of an Admin account to create at startup if missing
    #[arg(long, env = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    /// Password for the bootstrap Admin account
    #[arg(long, env = "ADMIN_PASSWORD")]
    pub admin_password: Option<String>,

    /// Display name for the bootstrap Admin account
    #[arg(long, env = "ADMIN_NAME", default_value = "Administrator")]
    pub admin_name: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn database_url(&self) -> String {
        self.database_url.clone().unwrap_or_else(|| {
            let data_dir = dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("docgen-api");
            std::fs::create_dir_all(&data_dir).ok();
            format!("sqlite:{}/docgen.db?mode=rwc", data_dir.display())
        })
    }
}

/// Get platform-specific data directory
mod dirs {
    use std::path::PathBuf;

    pub fn data_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(target_os = "windows")]
        {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }
}
