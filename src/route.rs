//! Route definitions for the clipboard service
//!
//! This module configures all HTTP routes and maps them to their respective handlers.

use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

use crate::database::AppState;
use crate::handler::{cleanup_expired, create_clip, get_clip};
use crate::middleware::cron_auth;
use crate::storage::{MAX_FILE_SIZE, UPLOADS_PATH};
use crate::view::{index, view_clip};

/// Request body ceiling: the file limit plus room for the other form fields
pub const MAX_BODY_SIZE: usize = MAX_FILE_SIZE as usize + 1024 * 1024;

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// - `GET /` - Create form
/// - `GET /{slug}` - Clip viewer page
/// - `POST /clips` - Creates a clip (multipart form)
/// - `GET /clips/{slug}` - Returns a clip as JSON
/// - `GET /cron/cleanup-expired` - Deletes expired clips (guarded by the cron secret)
/// - `GET /uploads/*` - Files stored by the local storage backend
///
/// # Arguments
///
/// * `state` - Application state with repository, storage backend, and cron secret
/// * `upload_dir` - Directory served under `/uploads`
///
/// # Example Usage
///
/// ```no_run
/// # use std::path::Path;
/// # use cl1p::config::Config;
/// # use cl1p::database::{init_db, AppState};
/// # use cl1p::route::create_app;
/// # use cl1p::storage::build_file_store;
/// let config = Config::from_env();
/// let db = init_db(&config.database_path).unwrap();
/// let state = AppState::new(db, build_file_store(&config), config.cron_secret.clone());
/// let app = create_app(state, &config.upload_dir);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState, upload_dir: &Path) -> Router {
    // Cleanup trigger, protected by the optional shared secret
    let cron_routes = Router::new()
        .route("/cleanup-expired", get(cleanup_expired))
        .layer(middleware::from_fn_with_state(state.clone(), cron_auth));

    Router::new()
        // Pages
        .route("/", get(index))
        .route("/{slug}", get(view_clip))
        // JSON API
        .route("/clips", post(create_clip))
        .route("/clips/{slug}", get(get_clip))
        .nest("/cron", cron_routes)
        // Locally stored files
        .nest_service(UPLOADS_PATH, ServeDir::new(upload_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        // Inject the application state into all handlers
        .with_state(state)
}
