//! File storage backends
//!
//! A clip may carry one uploaded file. The file is written either to a blob
//! store over HTTP or to a local directory served under `/uploads`. Which one
//! is used is decided once at startup by [`build_file_store`]; handlers only
//! see the [`FileStore`] trait object.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::model::FileMeta;

/// Maximum accepted file size (10 MiB)
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// URL path prefix under which locally stored files are served
pub const UPLOADS_PATH: &str = "/uploads";

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The file exceeds [`MAX_FILE_SIZE`]
    #[error("File size exceeds 10MB limit")]
    TooLarge { size: u64 },
    /// Local filesystem write failed
    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),
    /// Blob store request failed or returned an error status
    #[error("Blob upload failed: {0}")]
    Blob(#[from] reqwest::Error),
    /// The configured blob API URL cannot carry an object key
    #[error("Invalid blob API URL: {0}")]
    InvalidUrl(String),
    /// A URL handed to [`FileStore::remove`] was not issued by this store
    #[error("Not a stored file URL: {0}")]
    ForeignUrl(String),
}

/// A file received from a create form, not yet persisted
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl IncomingFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Persists file bytes and returns the public URL they can be fetched from
#[async_trait::async_trait]
pub trait FileStore: Send + Sync {
    /// Writes exactly one object for `slug` and returns its URL.
    async fn put(
        &self,
        slug: &str,
        file_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<String, StorageError>;

    /// Deletes an object previously returned by [`FileStore::put`]
    async fn remove(&self, url: &str) -> Result<(), StorageError>;

    /// Short backend name used in logs
    fn backend(&self) -> &'static str;
}

/// Checks the size ceiling and stores the file through `store`
///
/// Nothing is written when the file is too large.
pub async fn upload_file(
    store: &dyn FileStore,
    file: IncomingFile,
    slug: &str,
) -> Result<FileMeta, StorageError> {
    let size = file.size();
    if size > MAX_FILE_SIZE {
        return Err(StorageError::TooLarge { size });
    }

    let key_name = sanitize_file_name(&file.name);
    let url = store
        .put(slug, &key_name, &file.content_type, file.bytes)
        .await?;

    tracing::info!(
        backend = store.backend(),
        slug,
        file_name = %file.name,
        size,
        "stored clip file"
    );

    Ok(FileMeta {
        url,
        name: file.name,
        content_type: file.content_type,
        size,
    })
}

/// Keeps only the final path component of a client-supplied file name
fn sanitize_file_name(name: &str) -> String {
    match name.rsplit(['/', '\\']).next().map(str::trim) {
        Some(base) if !base.is_empty() && base != "." && base != ".." => base.to_string(),
        _ => "file".to_string(),
    }
}

/// Chooses the storage backend from configuration
///
/// A configured blob token selects the blob store, otherwise files go to the
/// local upload directory.
pub fn build_file_store(config: &Config) -> Arc<dyn FileStore> {
    match &config.blob_token {
        Some(token) => Arc::new(BlobFileStore::new(
            reqwest::Client::new(),
            config.blob_api_url.clone(),
            token.clone(),
        )),
        None => Arc::new(LocalFileStore::new(
            config.upload_dir.clone(),
            config.public_base_url.clone(),
        )),
    }
}

/// Stores files in a local directory
///
/// Key: `{slug}-{epoch_millis}-{file_name}`, URL: `{base_url}/uploads/{key}`.
pub struct LocalFileStore {
    dir: PathBuf,
    base_url: String,
}

impl LocalFileStore {
    pub fn new(dir: PathBuf, base_url: String) -> Self {
        Self { dir, base_url }
    }

    /// Maps a URL issued by this store back to its key
    fn key_of<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.base_url.trim_end_matches('/'))?
            .strip_prefix(UPLOADS_PATH)?
            .strip_prefix('/')
            .filter(|key| !key.is_empty() && !key.contains(['/', '\\']) && *key != "..")
    }
}

#[async_trait::async_trait]
impl FileStore for LocalFileStore {
    async fn put(
        &self,
        slug: &str,
        file_name: &str,
        _content_type: &str,
        bytes: Bytes,
    ) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let key = format!("{}-{}-{}", slug, Utc::now().timestamp_millis(), file_name);
        tokio::fs::write(self.dir.join(&key), &bytes).await?;

        Ok(format!(
            "{}{}/{}",
            self.base_url.trim_end_matches('/'),
            UPLOADS_PATH,
            key
        ))
    }

    async fn remove(&self, url: &str) -> Result<(), StorageError> {
        let key = self
            .key_of(url)
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        tokio::fs::remove_file(self.dir.join(key)).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}

/// Stores files in an HTTP blob store (Vercel Blob compatible)
///
/// Key: `{slug}-{file_name}`, uploaded with `PUT {api_url}/{key}` and a
/// bearer token. The store answers with the public URL of the object.
/// Uploads never overwrite an existing object, so two creates racing for the
/// same slug cannot clobber each other's file. Objects are deleted with
/// `POST {api_url}/delete`.
pub struct BlobFileStore {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

#[derive(Deserialize)]
struct BlobPutResponse {
    url: String,
}

#[derive(Serialize)]
struct BlobDeleteRequest<'a> {
    urls: [&'a str; 1],
}

impl BlobFileStore {
    pub fn new(client: reqwest::Client, api_url: String, token: String) -> Self {
        Self {
            client,
            api_url,
            token,
        }
    }

    fn object_url(&self, key: &str) -> Result<reqwest::Url, StorageError> {
        let mut url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| StorageError::InvalidUrl(format!("{}: {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .push(key);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl FileStore for BlobFileStore {
    async fn put(
        &self,
        slug: &str,
        file_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<String, StorageError> {
        let key = format!("{slug}-{file_name}");
        let url = self.object_url(&key)?;

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .header("x-content-type", content_type)
            .header("x-allow-overwrite", "0")
            .body(bytes)
            .send()
            .await?
            .error_for_status()?;

        let blob: BlobPutResponse = response.json().await?;
        Ok(blob.url)
    }

    async fn remove(&self, url: &str) -> Result<(), StorageError> {
        self.client
            .post(self.object_url("delete")?)
            .bearer_auth(&self.token)
            .json(&BlobDeleteRequest { urls: [url] })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "blob"
    }
}
