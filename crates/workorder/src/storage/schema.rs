//! `SQLite` schema definitions for the generated-file registry.

/// SQL statement to create the generated files table.
pub const CREATE_GENERATED_FILES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS generated_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create an index on `created_at` for age sweeps.
pub const CREATE_CREATED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_generated_files_created_at ON generated_files(created_at)
";

/// SQL statement to create an index on `filename` for deletions.
pub const CREATE_FILENAME_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_generated_files_filename ON generated_files(filename)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_GENERATED_FILES_TABLE,
    CREATE_CREATED_AT_INDEX,
    CREATE_FILENAME_INDEX,
    CREATE_METADATA_TABLE,
];
