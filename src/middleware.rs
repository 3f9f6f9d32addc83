use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::database::AppState;
use crate::error::ApiError;

/// Middleware guarding the cleanup trigger
///
/// If a cron secret is configured, the request must carry
/// `Authorization: Bearer <secret>`. Without a configured secret every request
/// is let through; a missing header is only logged, since schedulers that
/// call the endpoint usually attach one.
pub async fn cron_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.cron_secret.as_deref() {
        Some(secret) => {
            let presented = auth_header.and_then(|value| value.strip_prefix("Bearer "));
            if presented != Some(secret) {
                tracing::warn!("cleanup trigger rejected: invalid or missing bearer token");
                return Err(ApiError::Unauthorized);
            }
        }
        None => {
            if auth_header.is_none() {
                tracing::warn!("cleanup trigger called without authorization header");
            }
        }
    }

    Ok(next.run(request).await)
}
