// Key-value storage backends for persisted task collections

use chrono::Utc;
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// String-keyed storage holding one serialized value per key
pub trait Storage: Send {
    /// Read the value stored under `key`, `None` if never written
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

/// Keys become file names, so keep them to a safe alphabet
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Storage key cannot be empty"));
    }
    if key.len() > 64 {
        return Err(eyre!("Storage key too long: {} (max 64 chars)", key));
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.') {
        return Err(eyre!(
            "Invalid storage key: {} (must be alphanumeric with _/-/.)",
            key
        ));
    }
    if key.starts_with('.') {
        return Err(eyre!("Invalid storage key: {} (cannot start with '.')", key));
    }
    Ok(())
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local storage; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items().remove(key);
        Ok(())
    }
}

// ============================================================================
// JSON files
// ============================================================================

/// One `{key}.json` file per key inside a directory
///
/// Writes go to a temporary file which then replaces the key file, under
/// an exclusive lock on `{key}.lock`. Reads take a shared lock.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `dir`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create storage directory")?;
        Ok(Self { dir })
    }

    /// Path of the file holding `key`
    pub fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn lock_file(&self, key: &str) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(format!("{}.lock", key)))
            .context("Failed to open storage lock file")
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.item_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let lock = self.lock_file(key)?;
        lock.lock_shared().context("Failed to acquire shared lock")?;
        let content = fs::read_to_string(&path).context("Failed to read storage file")?;

        // Lock is released when `lock` is dropped
        Ok(Some(content))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.item_path(key);
        let tmp_path = self.dir.join(format!("{}.json.tmp", key));

        let lock = self.lock_file(key)?;
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        let mut tmp = File::create(&tmp_path).context("Failed to create temporary storage file")?;
        tmp.write_all(value.as_bytes())?;
        tmp.sync_all()?; // Ensure data is flushed to disk before the swap
        fs::rename(&tmp_path, &path).context("Failed to replace storage file")?;

        debug!(key, bytes = value.len(), path = ?path, "wrote storage file");
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.item_path(key);

        let lock = self.lock_file(key)?;
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove storage file"),
        }
    }
}

// ============================================================================
// SQLite
// ============================================================================

/// Key-value table in a SQLite database
pub struct SqliteStorage {
    db: Connection,
}

impl SqliteStorage {
    /// Open or create the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
        let db = Connection::open(path.as_ref()).context("Failed to open SQLite database")?;
        Self::from_connection(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        Self::from_connection(db)
    }

    fn from_connection(db: Connection) -> Result<Self> {
        let storage = Self { db };
        storage.create_schema()?;
        Ok(storage)
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating key-value schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage").field("path", &self.db.path()).finish()
    }
}

impl Storage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .context("Failed to read key from SQLite")?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.db
            .execute(
                "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, Utc::now().timestamp_millis()],
            )
            .context("Failed to write key to SQLite")?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.db
            .execute("DELETE FROM kv WHERE key = ?1", [key])
            .context("Failed to delete key from SQLite")?;
        Ok(())
    }
}
