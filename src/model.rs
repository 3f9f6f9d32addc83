//! Data models for the clipboard application
//!
//! This module defines the persisted clip record and the request/response
//! shapes exchanged over HTTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of a file attached to a clip
///
/// The four fields are always stored together: a clip either carries a
/// complete `FileMeta` or none at all.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileMeta {
    /// Public URL the file can be downloaded from
    pub url: String,

    /// Original file name as uploaded by the user
    pub name: String,

    /// MIME type reported by the client
    pub content_type: String,

    /// Size of the file in bytes
    pub size: u64,
}

/// Represents a clip record stored in the database
///
/// Stored as JSON under its slug in the clips table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Clip {
    /// Lowercased, validated slug; the primary key
    pub slug: String,

    /// Optional text content
    pub content: Option<String>,

    /// Optional attached file
    pub file: Option<FileMeta>,

    /// Timestamp when this clip was created
    pub created_at: DateTime<Utc>,

    /// Expiration timestamp, `None` means the clip never expires
    pub expires_at: Option<DateTime<Utc>>,

    /// Delete the clip after it has been viewed once
    #[serde(default = "default_destroy_on_read")]
    pub destroy_on_read: bool,

    /// When the clip was first read under destroy-on-read
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

fn default_destroy_on_read() -> bool {
    true
}

impl Clip {
    /// Returns true when `expires_at` lies strictly before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at < now)
    }
}

/// Response returned after successfully creating a clip
///
/// # Example
/// ```json
/// {
///   "slug": "my-clip",
///   "message": "Clip created successfully"
/// }
/// ```
#[derive(Serialize, Deserialize, Debug)]
pub struct CreateResponse {
    pub slug: String,
    pub message: String,
}

/// Full clip payload returned by `GET /clips/{slug}`
///
/// File fields are flattened and serialized as `null` when the clip has no
/// attachment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClipResponse {
    pub slug: String,
    pub content: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub destroy_on_read: bool,
}

impl From<Clip> for ClipResponse {
    fn from(clip: Clip) -> Self {
        let (file_url, file_name, file_type, file_size) = match clip.file {
            Some(file) => (
                Some(file.url),
                Some(file.name),
                Some(file.content_type),
                Some(file.size),
            ),
            None => (None, None, None, None),
        };

        Self {
            slug: clip.slug,
            content: clip.content,
            file_url,
            file_name,
            file_type,
            file_size,
            created_at: clip.created_at,
            expires_at: clip.expires_at,
            destroy_on_read: clip.destroy_on_read,
        }
    }
}

/// Result of a cleanup sweep
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub success: bool,
    pub deleted_count: usize,
    pub expired_clips_found: usize,
    pub timestamp: DateTime<Utc>,
}
