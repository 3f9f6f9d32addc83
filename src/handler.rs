//! HTTP request handlers for the clipboard API
//!
//! This module implements the clip lifecycle:
//! - Creating clips from multipart form submissions
//! - Reading clips, with lazy expiry and destroy-on-read
//! - Sweeping expired clips on an external trigger

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::database::AppState;
use crate::error::ApiError;
use crate::model::{CleanupResponse, Clip, ClipResponse, CreateResponse};
use crate::repository::{ClipRepository, RepositoryError};
use crate::storage::{upload_file, IncomingFile, MAX_FILE_SIZE};
use crate::validation::{calculate_expiration, validate_create_request, validate_slug, CreateFields};

/// Multipart fields of a create request, before validation
#[derive(Debug, Default)]
struct CreateForm {
    fields: CreateFields,
    content: Option<String>,
    file: Option<IncomingFile>,
}

impl CreateForm {
    async fn from_multipart(multipart: &mut Multipart) -> Result<Self, ApiError> {
        let mut form = CreateForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match name.as_str() {
                "slug" => form.fields.slug = Some(field.text().await.map_err(multipart_error)?),
                "ttl" => form.fields.ttl = Some(field.text().await.map_err(multipart_error)?),
                "destroyOnRead" => {
                    form.fields.destroy_on_read = Some(field.text().await.map_err(multipart_error)?)
                }
                "content" => {
                    let text = field.text().await.map_err(multipart_error)?;
                    form.content = Some(text).filter(|text| !text.is_empty());
                }
                "file" => {
                    let file_name = field.file_name().unwrap_or("file").to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(multipart_error)?;

                    // Browsers submit an empty part when no file was chosen
                    form.file = (!bytes.is_empty()).then(|| IncomingFile {
                        name: file_name,
                        content_type,
                        bytes,
                    });
                }
                other => tracing::debug!(field = other, "ignoring unknown form field"),
            }
        }

        Ok(form)
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::Validation(format!(
            "File size exceeds {}MB limit",
            MAX_FILE_SIZE / (1024 * 1024)
        ))
    } else {
        ApiError::Validation(format!("Invalid form data: {}", err.body_text()))
    }
}

/// Creates a new clip
///
/// # Request Body (multipart/form-data)
///
/// - `slug` (required) - 3-50 characters of `[a-zA-Z0-9_-]`
/// - `content` (optional) - Text content
/// - `file` (optional) - A single file, at most 10 MB
/// - `ttl` (optional) - One of `1min`, `10min`, `1hour`, `1day`, `1week`, `1month`
/// - `destroyOnRead` (optional) - `"true"` or `"false"`, defaults to true
///
/// # Response
///
/// - **201 Created** - `{"slug": "...", "message": "Clip created successfully"}`
/// - **400 Bad Request** - Validation failure or neither content nor file given
/// - **409 Conflict** - Slug already taken
/// - **500 Internal Server Error** - Storage or database failure
///
/// The file is stored before the clip is inserted; a failed upload leaves
/// no record behind. When a concurrent create wins the slug in between, the
/// uploaded file is discarded and the request answers 409.
pub async fn create_clip(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreateResponse>), ApiError> {
    let form = CreateForm::from_multipart(&mut multipart).await?;
    let validated = validate_create_request(&form.fields)?;

    if state.repo.find_by_slug(&validated.slug)?.is_some() {
        return Err(ApiError::Conflict);
    }

    if form.content.is_none() && form.file.is_none() {
        return Err(ApiError::Validation(
            "Either content or file must be provided".to_string(),
        ));
    }

    let file = match form.file {
        Some(file) => match upload_file(state.storage.as_ref(), file, &validated.slug).await {
            Ok(meta) => Some(meta),
            // The blob store refuses to overwrite the object of a racing create
            Err(e) if state.repo.find_by_slug(&validated.slug)?.is_some() => {
                tracing::info!(slug = %validated.slug, error = %e, "slug taken during upload");
                return Err(ApiError::Conflict);
            }
            Err(e) => return Err(e.into()),
        },
        None => None,
    };
    let uploaded_url = file.as_ref().map(|meta| meta.url.clone());

    let now = Utc::now();
    let clip = Clip {
        slug: validated.slug.clone(),
        content: form.content,
        file,
        created_at: now,
        expires_at: calculate_expiration(validated.ttl.map(|ttl| ttl.token()), now),
        destroy_on_read: validated.destroy_on_read,
        read_at: None,
    };

    // A concurrent create may have won the slug since the check above
    let clip = match state.repo.create(clip) {
        Ok(clip) => clip,
        Err(e) => {
            if let Some(url) = uploaded_url {
                discard_upload(&state, &validated.slug, &url).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        slug = %clip.slug,
        has_file = clip.file.is_some(),
        expires_at = ?clip.expires_at,
        destroy_on_read = clip.destroy_on_read,
        "clip created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateResponse {
            slug: clip.slug,
            message: "Clip created successfully".to_string(),
        }),
    ))
}

/// Best-effort removal of a file whose clip was never inserted
///
/// The file is kept if the clip now stored under `slug` points at it.
async fn discard_upload(state: &AppState, slug: &str, url: &str) {
    let in_use = state
        .repo
        .find_by_slug(slug)
        .ok()
        .flatten()
        .and_then(|winner| winner.file)
        .is_some_and(|file| file.url == url);
    if in_use {
        return;
    }

    match state.storage.remove(url).await {
        Ok(()) => tracing::debug!(slug, url, "discarded orphaned upload"),
        Err(e) => tracing::warn!(slug, url, error = %e, "failed to discard orphaned upload"),
    }
}

/// Returns a clip by slug
///
/// # Path Parameters
///
/// - `slug` - The clip identifier (case-insensitive)
///
/// # Response
///
/// - **200 OK** - Full clip payload
/// - **400 Bad Request** - Malformed slug
/// - **404 Not Found** - Unknown slug
/// - **410 Gone** - The clip expired; it is deleted as a side effect
///
/// Destroy-on-read clips are returned in full and deleted afterwards in the
/// background, see [`spawn_destroy`].
pub async fn get_clip(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ClipResponse>, ApiError> {
    let clip = read_clip(&state, &slug)?;
    Ok(Json(clip.into()))
}

/// Read path shared by the JSON API and the viewer page
pub fn read_clip(state: &AppState, slug_param: &str) -> Result<Clip, ApiError> {
    let slug = validate_slug(slug_param)
        .map_err(|_| ApiError::Validation("Invalid slug format".to_string()))?;

    let clip = state.repo.find_by_slug(&slug)?.ok_or(ApiError::NotFound)?;

    let now = Utc::now();
    if clip.is_expired_at(now) {
        state.repo.delete_by_slug(&slug)?;
        tracing::info!(%slug, "expired clip removed on read");
        return Err(ApiError::Expired);
    }

    if clip.destroy_on_read {
        state.repo.mark_read(&slug, now)?;
        spawn_destroy(state.repo.clone(), slug);
    }

    Ok(clip)
}

/// Deletes a read clip on a detached blocking task
///
/// The response does not wait for this task and nothing retries it. A
/// failure is only logged; the row is then reaped by a later read or the
/// cleanup sweep. Concurrent reads racing this delete may still succeed.
pub fn spawn_destroy(repo: ClipRepository, slug: String) {
    tokio::task::spawn_blocking(move || match repo.delete_by_slug(&slug) {
        Ok(()) => tracing::debug!(%slug, "destroy-on-read clip deleted"),
        Err(e) => tracing::error!(%slug, error = %e, "failed to delete destroy-on-read clip"),
    });
}

/// Deletes all expired clips
///
/// Meant to be called by an external scheduler; access is guarded by
/// [`crate::middleware::cron_auth`].
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "deletedCount": 3,
///   "expiredClipsFound": 3,
///   "timestamp": "2026-01-17T13:40:00Z"
/// }
/// ```
pub async fn cleanup_expired(
    State(state): State<AppState>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let now = Utc::now();

    let sweep = || -> Result<(usize, usize), RepositoryError> {
        let found = state.repo.find_expired(now)?.len();
        let deleted = state.repo.delete_expired(now)?;
        Ok((found, deleted))
    };

    let (expired_clips_found, deleted_count) =
        sweep().map_err(|e| ApiError::Internal(format!("Cleanup failed: {e}")))?;

    tracing::info!(deleted_count, expired_clips_found, "expired clips swept");

    Ok(Json(CleanupResponse {
        success: true,
        deleted_count,
        expired_clips_found,
        timestamp: now,
    }))
}
