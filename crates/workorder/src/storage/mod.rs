//! Storage layer for workorder.
//!
//! A `SQLite` registry of generated files. Each row is a filename and the
//! time it was written; the janitor uses it to find files that have
//! outlived their retention window.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// A file recorded in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    /// Row identifier.
    pub id: i64,
    /// File name, relative to the output directory.
    pub filename: String,
    /// When the file was registered.
    pub created_at: DateTime<Utc>,
}

/// Registry of generated files.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a registry database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory registry for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a freshly written file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn add_file(&self, filename: &str) -> Result<i64> {
        self.add_file_at(filename, Utc::now())
    }

    /// Record a file with an explicit creation time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn add_file_at(&self, filename: &str, created_at: DateTime<Utc>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO generated_files (filename, created_at) VALUES (?1, ?2)",
            params![filename, encode_timestamp(created_at)],
        )?;

        let id = self.conn.last_insert_rowid();
        info!("Registered file {} (id {})", filename, id);
        Ok(id)
    }

    /// List file names registered at or before `now - max_age`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn files_older_than(&self, max_age: Duration) -> Result<Vec<String>> {
        let max_age = chrono::Duration::from_std(max_age)
            .map_err(|e| Error::internal(format!("max age out of range: {e}")))?;
        let cutoff = encode_timestamp(Utc::now() - max_age);

        let mut stmt = self.conn.prepare(
            r"
            SELECT filename FROM generated_files
            WHERE created_at <= ?1
            ORDER BY created_at ASC
            ",
        )?;

        let files = stmt
            .query_map([cutoff], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(files)
    }

    /// Delete every row for `filename`.
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_file(&self, filename: &str) -> Result<usize> {
        let affected = self
            .conn
            .execute("DELETE FROM generated_files WHERE filename = ?1", [filename])?;
        Ok(affected)
    }

    /// Look up a registered file by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find(&self, filename: &str) -> Result<Option<GeneratedFile>> {
        let file = self
            .conn
            .query_row(
                r"
                SELECT id, filename, created_at FROM generated_files
                WHERE filename = ?1 ORDER BY id DESC LIMIT 1
                ",
                [filename],
                Self::row_to_file,
            )
            .optional()?;
        Ok(file)
    }

    /// List all registered files, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<GeneratedFile>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, filename, created_at FROM generated_files
            ORDER BY created_at DESC, id DESC
            ",
        )?;

        let files = stmt
            .query_map([], Self::row_to_file)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(files)
    }

    /// Count registered files.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM generated_files", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get registry statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_files = self.count()?;

        let (oldest, newest): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(created_at), MAX(created_at) FROM generated_files",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(StorageStats {
            total_files,
            oldest_file: oldest.as_deref().and_then(decode_timestamp),
            newest_file: newest.as_deref().and_then(decode_timestamp),
        })
    }

    fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<GeneratedFile> {
        let id: i64 = row.get(0)?;
        let filename: String = row.get(1)?;
        let created_at_str: String = row.get(2)?;

        let created_at = decode_timestamp(&created_at_str).unwrap_or_else(|| {
            warn!(
                "Unparseable created_at '{}' for {}, treating as now",
                created_at_str, filename
            );
            Utc::now()
        });

        Ok(GeneratedFile {
            id,
            filename,
            created_at,
        })
    }
}

/// Registry statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Number of registered files.
    pub total_files: i64,
    /// Registration time of the oldest file.
    pub oldest_file: Option<DateTime<Utc>>,
    /// Registration time of the newest file.
    pub newest_file: Option<DateTime<Utc>>,
}

/// Whether `name` names a file directly inside the output directory.
///
/// Rejects empty names, path separators, parent references, and quotes or
/// control characters that cannot be echoed into a header.
#[must_use]
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\', '"'])
        && !name.chars().any(char::is_control)
        && !name.contains("..")
        && name != "."
}

/// Fixed-width UTC form; lexical order matches chronological order.
fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn decode_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn minutes_ago(minutes: i64) -> DateTime<Utc> {
        Utc::now() - chrono::Duration::minutes(minutes)
    }

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("OS240305-1407_ABC1234_1a2b3c4d.pdf"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name("."));
        assert!(!is_plain_file_name("../os_files.db"));
        assert!(!is_plain_file_name("a/b.pdf"));
        assert!(!is_plain_file_name("a\\b.pdf"));
        assert!(!is_plain_file_name("a..pdf"));
        assert!(!is_plain_file_name("a\"b.pdf"));
        assert!(!is_plain_file_name("a\r\nb.pdf"));
    }

    #[test]
    fn test_open_in_memory() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("os_files.db");

        let storage = Storage::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(storage.path(), path.as_path());
    }

    #[test]
    fn test_add_and_find() {
        let storage = create_test_storage();
        let id = storage.add_file("OS240101-1200_ABC1234_ab12.pdf").unwrap();
        assert!(id > 0);

        let file = storage
            .find("OS240101-1200_ABC1234_ab12.pdf")
            .unwrap()
            .unwrap();
        assert_eq!(file.id, id);
        assert!(storage.find("missing.pdf").unwrap().is_none());
    }

    #[test]
    fn test_files_older_than() {
        let storage = create_test_storage();
        storage.add_file_at("old.pdf", minutes_ago(10)).unwrap();
        storage.add_file_at("older.pdf", minutes_ago(60)).unwrap();
        storage.add_file("fresh.pdf").unwrap();

        let stale = storage.files_older_than(Duration::from_secs(300)).unwrap();
        assert_eq!(stale, vec!["older.pdf".to_string(), "old.pdf".to_string()]);
    }

    #[test]
    fn test_files_older_than_includes_boundary() {
        let storage = create_test_storage();
        storage.add_file_at("edge.pdf", minutes_ago(5)).unwrap();

        let stale = storage.files_older_than(Duration::from_secs(300)).unwrap();
        assert_eq!(stale, vec!["edge.pdf".to_string()]);
    }

    #[test]
    fn test_delete_file() {
        let storage = create_test_storage();
        storage.add_file("a.pdf").unwrap();
        storage.add_file("b.pdf").unwrap();

        assert_eq!(storage.delete_file("a.pdf").unwrap(), 1);
        assert_eq!(storage.delete_file("a.pdf").unwrap(), 0);
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn test_delete_file_removes_duplicates() {
        let storage = create_test_storage();
        storage.add_file("dup.pdf").unwrap();
        storage.add_file("dup.pdf").unwrap();

        assert_eq!(storage.delete_file("dup.pdf").unwrap(), 2);
    }

    #[test]
    fn test_list_newest_first() {
        let storage = create_test_storage();
        storage.add_file_at("first.pdf", minutes_ago(30)).unwrap();
        storage.add_file_at("second.pdf", minutes_ago(20)).unwrap();
        storage.add_file_at("third.pdf", minutes_ago(10)).unwrap();

        let names: Vec<String> = storage
            .list()
            .unwrap()
            .into_iter()
            .map(|f| f.filename)
            .collect();
        assert_eq!(names, vec!["third.pdf", "second.pdf", "first.pdf"]);
    }

    #[test]
    fn test_stats_empty() {
        let stats = create_test_storage().stats().unwrap();

        assert_eq!(stats.total_files, 0);
        assert!(stats.oldest_file.is_none());
        assert!(stats.newest_file.is_none());
    }

    #[test]
    fn test_stats_with_data() {
        let storage = create_test_storage();
        let older = minutes_ago(30);
        storage.add_file_at("first.pdf", older).unwrap();
        storage.add_file("second.pdf").unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_files, 2);
        assert_eq!(
            stats.oldest_file.unwrap().timestamp(),
            older.timestamp()
        );
        assert!(stats.newest_file.unwrap() > stats.oldest_file.unwrap());
    }

    #[test]
    fn test_timestamp_encoding_roundtrip_is_second_precise() {
        let now = Utc::now();
        let decoded = decode_timestamp(&encode_timestamp(now)).unwrap();
        assert_eq!(decoded.timestamp(), now.timestamp());
        assert!(encode_timestamp(now).ends_with('Z'));
    }
}
