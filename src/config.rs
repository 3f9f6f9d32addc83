//! Process configuration
//!
//! Read once at startup from the environment (and `.env`, loaded by `main`).
//! Everything downstream receives plain values from [`Config`] instead of
//! consulting the environment itself.

use std::env;
use std::path::PathBuf;

/// Default endpoint of the blob store HTTP API
pub const DEFAULT_BLOB_API_URL: &str = "https://blob.vercel-storage.com";

/// Application configuration
///
/// # Environment Variables
///
/// - `PORT` - Server port number (default: 8080)
/// - `DATABASE_URL` - Path to database file (default: "data.db")
/// - `BLOB_READ_WRITE_TOKEN` - Blob store token; its presence selects the blob backend
/// - `BLOB_API_URL` - Blob store API endpoint (default: Vercel Blob)
/// - `PUBLIC_BASE_URL` - Base URL used to build links to locally stored files
/// - `UPLOAD_DIR` - Directory for locally stored files (default: "uploads")
/// - `CRON_SECRET` - Shared secret required by the cleanup endpoint
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub blob_token: Option<String>,
    pub blob_api_url: String,
    pub public_base_url: String,
    pub upload_dir: PathBuf,
    pub cron_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(8080);

        Self {
            port,
            database_path: env::var("DATABASE_URL").unwrap_or_else(|_| "data.db".to_string()),
            blob_token: non_empty_var("BLOB_READ_WRITE_TOKEN"),
            blob_api_url: non_empty_var("BLOB_API_URL")
                .unwrap_or_else(|| DEFAULT_BLOB_API_URL.to_string()),
            public_base_url: non_empty_var("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{port}")),
            upload_dir: non_empty_var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            cron_secret: non_empty_var("CRON_SECRET"),
        }
    }
}

/// An unset variable and an empty one are treated the same
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}
