//! Clip repository over the redb clips table
//!
//! Every operation runs in its own transaction. Write transactions in redb are
//! serialized, so the existence check and the insert in [`ClipRepository::create`]
//! together decide slug uniqueness.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable};

use crate::database::TABLE_CLIPS;
use crate::model::Clip;

/// Repository error type
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A clip with this slug already exists
    #[error("slug '{0}' is already taken")]
    Conflict(String),
    #[error("database transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),
    #[error("database table error: {0}")]
    Table(#[from] redb::TableError),
    #[error("database storage error: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("database commit error: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("corrupt clip record: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence operations for clips
#[derive(Clone)]
pub struct ClipRepository {
    db: Arc<Database>,
}

impl ClipRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Inserts a new clip, failing with [`RepositoryError::Conflict`] if the
    /// slug is taken. The existing record is never touched.
    pub fn create(&self, clip: Clip) -> Result<Clip, RepositoryError> {
        let record_json = serde_json::to_string(&clip)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TABLE_CLIPS)?;

            if table.get(clip.slug.as_str())?.is_some() {
                return Err(RepositoryError::Conflict(clip.slug));
            }

            table.insert(clip.slug.as_str(), record_json.as_str())?;
        }
        write_txn.commit()?;

        Ok(clip)
    }

    pub fn find_by_slug(&self, slug: &str) -> Result<Option<Clip>, RepositoryError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_CLIPS)?;

        let clip = match table.get(slug)? {
            Some(value) => Some(serde_json::from_str::<Clip>(value.value())?),
            None => None,
        };
        Ok(clip)
    }

    /// Removes a clip. Deleting an unknown slug is not an error.
    pub fn delete_by_slug(&self, slug: &str) -> Result<(), RepositoryError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TABLE_CLIPS)?;
            table.remove(slug)?;
        }
        write_txn.commit()?;

        Ok(())
    }

    /// Stamps `read_at` on an existing clip; unknown slugs are ignored
    pub fn mark_read(&self, slug: &str, read_at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TABLE_CLIPS)?;

            let existing = match table.get(slug)? {
                Some(value) => Some(serde_json::from_str::<Clip>(value.value())?),
                None => None,
            };

            if let Some(mut clip) = existing {
                clip.read_at = Some(read_at);
                let record_json = serde_json::to_string(&clip)?;
                table.insert(slug, record_json.as_str())?;
            }
        }
        write_txn.commit()?;

        Ok(())
    }

    /// Slugs of all clips whose `expires_at` lies strictly before `now`
    pub fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, RepositoryError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_CLIPS)?;

        collect_expired(&table, now)
    }

    /// Deletes every clip whose `expires_at` is set and strictly before `now`
    ///
    /// Returns the number of deleted clips.
    pub fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(TABLE_CLIPS)?;

            let expired = collect_expired(&table, now)?;
            for slug in &expired {
                table.remove(slug.as_str())?;
            }
            expired.len()
        };
        write_txn.commit()?;

        Ok(deleted)
    }
}

fn collect_expired<T>(table: &T, now: DateTime<Utc>) -> Result<Vec<String>, RepositoryError>
where
    T: ReadableTable<&'static str, &'static str>,
{
    let mut expired = Vec::new();
    for entry in table.iter()? {
        let (key, value) = entry?;
        let clip = serde_json::from_str::<Clip>(value.value())?;
        if clip.is_expired_at(now) {
            expired.push(key.value().to_string());
        }
    }
    Ok(expired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::init_db;
    use crate::model::FileMeta;
    use chrono::Duration;
    use tempfile::NamedTempFile;

    fn setup_repo() -> (ClipRepository, NamedTempFile) {
        let temp_db = NamedTempFile::new().expect("Failed to create temp file");
        let db = init_db(temp_db.path().to_str().unwrap()).expect("Failed to init db");
        (ClipRepository::new(Arc::new(db)), temp_db)
    }

    fn clip(slug: &str, content: &str, expires_at: Option<DateTime<Utc>>) -> Clip {
        Clip {
            slug: slug.to_string(),
            content: Some(content.to_string()),
            file: None,
            created_at: Utc::now(),
            expires_at,
            destroy_on_read: false,
            read_at: None,
        }
    }

    #[test]
    fn test_create_and_find() {
        let (repo, _temp_db) = setup_repo();

        let mut record = clip("demo-1", "hello", None);
        record.file = Some(FileMeta {
            url: "https://blob.example/demo-1-a.png".to_string(),
            name: "a.png".to_string(),
            content_type: "image/png".to_string(),
            size: 42,
        });
        repo.create(record.clone()).unwrap();

        assert_eq!(repo.find_by_slug("demo-1").unwrap(), Some(record));
        assert_eq!(repo.find_by_slug("missing").unwrap(), None);
    }

    #[test]
    fn test_create_conflict_keeps_original() {
        let (repo, _temp_db) = setup_repo();

        repo.create(clip("taken", "original", None)).unwrap();
        let err = repo.create(clip("taken", "overwrite", None)).unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(ref slug) if slug == "taken"));
        let stored = repo.find_by_slug("taken").unwrap().unwrap();
        assert_eq!(stored.content.as_deref(), Some("original"));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (repo, _temp_db) = setup_repo();

        repo.create(clip("gone", "bye", None)).unwrap();
        repo.delete_by_slug("gone").unwrap();
        repo.delete_by_slug("gone").unwrap();
        repo.delete_by_slug("never-existed").unwrap();

        assert_eq!(repo.find_by_slug("gone").unwrap(), None);
    }

    #[test]
    fn test_mark_read() {
        let (repo, _temp_db) = setup_repo();
        let read_at = Utc::now();

        repo.create(clip("readme", "text", None)).unwrap();
        repo.mark_read("readme", read_at).unwrap();
        repo.mark_read("unknown", read_at).unwrap();

        let stored = repo.find_by_slug("readme").unwrap().unwrap();
        assert_eq!(stored.read_at, Some(read_at));
    }

    #[test]
    fn test_delete_expired_only_removes_past_clips() {
        let (repo, _temp_db) = setup_repo();
        let now = Utc::now();

        repo.create(clip("clip-a", "a", Some(now - Duration::seconds(1)))).unwrap();
        repo.create(clip("clip-b", "b", Some(now + Duration::hours(1)))).unwrap();
        repo.create(clip("clip-c", "c", None)).unwrap();

        assert_eq!(repo.find_expired(now).unwrap(), vec!["clip-a".to_string()]);
        assert_eq!(repo.delete_expired(now).unwrap(), 1);

        assert_eq!(repo.find_by_slug("clip-a").unwrap(), None);
        assert!(repo.find_by_slug("clip-b").unwrap().is_some());
        assert!(repo.find_by_slug("clip-c").unwrap().is_some());
        assert_eq!(repo.delete_expired(now).unwrap(), 0);
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        let (repo, _temp_db) = setup_repo();
        let now = Utc::now();

        repo.create(clip("edge", "e", Some(now))).unwrap();
        assert_eq!(repo.delete_expired(now).unwrap(), 0);
    }
}
