//! Database initialization, table definitions, and shared application state
//!
//! This module handles the setup of the embedded redb database and defines
//! the state handed to every request handler.

use redb::{Database, TableDefinition};
use std::sync::Arc;

use crate::repository::ClipRepository;
use crate::storage::FileStore;

/// Single table holding every clip
///
/// Key: lowercased slug
/// Value: JSON-serialized Clip
///
/// Example:
/// - Key: "demo-1"
/// - Value: '{"slug":"demo-1","content":"hello","file":null,...}'
pub const TABLE_CLIPS: TableDefinition<&str, &str> = TableDefinition::new("clips_v1");

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Clip persistence
    pub repo: ClipRepository,

    /// File storage backend chosen at startup
    pub storage: Arc<dyn FileStore>,

    /// Shared secret required by the cleanup trigger, if configured
    pub cron_secret: Option<String>,
}

impl AppState {
    pub fn new(db: Database, storage: Arc<dyn FileStore>, cron_secret: Option<String>) -> Self {
        Self {
            repo: ClipRepository::new(Arc::new(db)),
            storage,
            cron_secret,
        }
    }
}

/// Initializes the embedded database and creates the clips table
///
/// # Arguments
///
/// * `db_path` - File path where the database should be stored (e.g., "data.db")
///
/// # Example
///
/// ```no_run
/// # use cl1p::database::init_db;
/// let db = init_db("data.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    // Create or open the database file
    let db = Database::create(db_path)?;

    // Open (or create if not exists) the clips table so that readers never
    // observe a missing table
    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_CLIPS)?;
    }
    write_txn.commit()?;

    Ok(db)
}
