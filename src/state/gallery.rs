use parking_lot::Mutex;
use rusqlite::{params, Connection, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data::StoredImage;

/// Maximum number of images kept in the gallery
pub const MAX_IMAGES: usize = 50;

/// How long a writer waits for another process holding the database lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised by the gallery store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Image payload must not be empty")]
    EmptyPayload,

    #[error("Failed to create data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Source of insertion timestamps (milliseconds since the Unix epoch)
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock in UTC
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// The Gallery manages the SQLite store of generated images.
///
/// It keeps at most `capacity` images. Inserting into a full gallery
/// evicts the oldest image in the same transaction as the insert, so the
/// bound holds for every reader, including other processes sharing the file.
pub struct Gallery {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
    capacity: usize,
    clock: Box<dyn Clock>,
}

impl Gallery {
    /// Open (or create) the gallery database at `path`.
    ///
    /// The parent directory is created when missing.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::DataDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        log::info!("📁 Gallery database opened at: {}", path.display());

        let gallery = Self::from_connection(conn, Some(path.to_path_buf()));
        gallery.init_schema()?;
        Ok(gallery)
    }

    /// Open a throwaway gallery that lives only as long as this handle
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let gallery = Self::from_connection(Connection::open_in_memory()?, None);
        gallery.init_schema()?;
        Ok(gallery)
    }

    fn from_connection(conn: Connection, db_path: Option<PathBuf>) -> Self {
        Self {
            conn: Mutex::new(conn),
            db_path,
            capacity: MAX_IMAGES,
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the clock used to stamp new images
    #[cfg(test)]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Override the capacity (at least one image is always kept)
    #[cfg(test)]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Create the images table and its timestamp index if they don't exist
    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();

        // AUTOINCREMENT keeps ids from being reused after eviction
        conn.execute(
            "CREATE TABLE IF NOT EXISTS soul_images (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                url         TEXT NOT NULL,
                timestamp   INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_soul_images_timestamp
             ON soul_images(timestamp)",
            [],
        )?;

        log::debug!("Gallery schema initialized");
        Ok(())
    }

    /// Path to the database file (`None` for in-memory galleries)
    #[cfg(test)]
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of images currently stored
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM soul_images", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Store a new image, evicting the oldest one if the gallery is full.
    ///
    /// The count check, eviction and insert run inside a single immediate
    /// transaction. Nothing is written if any step fails.
    pub fn insert(&self, url: &str) -> Result<StoredImage, StoreError> {
        if url.is_empty() {
            return Err(StoreError::EmptyPayload);
        }

        let timestamp = self.clock.now_millis();

        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let count: i64 = tx.query_row("SELECT COUNT(*) FROM soul_images", [], |row| row.get(0))?;
        let overflow = count - self.capacity as i64 + 1;
        if overflow > 0 {
            let evicted = tx.execute(
                "DELETE FROM soul_images WHERE id IN (
                    SELECT id FROM soul_images ORDER BY timestamp ASC, id ASC LIMIT ?1
                )",
                params![overflow],
            )?;
            log::debug!("Evicted {} oldest image(s) to stay within {}", evicted, self.capacity);
        }

        tx.execute(
            "INSERT INTO soul_images (url, timestamp) VALUES (?1, ?2)",
            params![url, timestamp],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        log::debug!("Stored image {} at {}", id, timestamp);

        Ok(StoredImage {
            id,
            url: url.to_string(),
            timestamp,
        })
    }

    /// Get all images, newest first
    pub fn get_all(&self) -> Result<Vec<StoredImage>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, url, timestamp FROM soul_images ORDER BY timestamp DESC, id DESC",
        )?;

        let images = stmt
            .query_map([], |row| {
                Ok(StoredImage {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(images)
    }

    /// Remove every image. Ids handed out before the reset are not reused.
    #[cfg(test)]
    pub fn clear(&self) -> Result<usize, StoreError> {
        let removed = self.conn.lock().execute("DELETE FROM soul_images", [])?;
        if removed > 0 {
            log::info!("🧹 Cleared {} images from the gallery", removed);
        }
        Ok(removed)
    }

    /// Close the underlying connection, reporting any pending error
    pub fn close(self) -> Result<(), StoreError> {
        self.conn
            .into_inner()
            .close()
            .map_err(|(_, err)| StoreError::Sqlite(err))
    }
}

impl std::fmt::Debug for Gallery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gallery")
            .field("db_path", &self.db_path)
            .field("capacity", &self.capacity)
            .finish()
    }
}
