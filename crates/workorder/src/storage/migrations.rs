//! Database migration system for the file registry.
//!
//! Registries written by earlier deployments stored `created_at` with
//! `SQLite`'s `CURRENT_TIMESTAMP` (`YYYY-MM-DD HH:MM:SS`). The registry now
//! stores RFC 3339 UTC strings so that string order equals time order; the
//! version 2 migration rewrites legacy rows in place.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The current schema version.
pub const CURRENT_VERSION: i32 = 2;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Initialize the database schema.
///
/// Creates all tables and indexes if they don't exist, then runs any
/// pending migrations to bring the schema up to the current version.
///
/// # Errors
///
/// Returns an error if schema creation or migration fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let version = schema_version(conn)?;
    if version < CURRENT_VERSION {
        migrate(conn, version)?;
    }

    Ok(())
}

/// Read the schema version. A database without one reports 0.
fn schema_version(conn: &Connection) -> Result<i32> {
    let result: std::result::Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    );

    match result {
        Ok(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn record_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

/// Step from `from_version` up to [`CURRENT_VERSION`], one version at a time.
fn migrate(conn: &Connection, from_version: i32) -> Result<()> {
    for version in (from_version + 1)..=CURRENT_VERSION {
        apply(conn, version)?;
        record_version(conn, version)?;
    }
    Ok(())
}

fn apply(conn: &Connection, version: i32) -> Result<()> {
    match version {
        // Base schema comes from SCHEMA_STATEMENTS
        1 => Ok(()),
        2 => normalize_legacy_timestamps(conn),
        _ => Err(Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        }),
    }
}

/// Rewrite `CURRENT_TIMESTAMP`-style values as RFC 3339 UTC.
fn normalize_legacy_timestamps(conn: &Connection) -> Result<()> {
    let rewritten = conn.execute(
        r"
        UPDATE generated_files
        SET created_at = strftime('%Y-%m-%dT%H:%M:%SZ', created_at)
        WHERE created_at NOT LIKE '%T%' AND strftime('%s', created_at) IS NOT NULL
        ",
        [],
    )?;

    if rewritten > 0 {
        info!("Normalized {} legacy registry timestamps", rewritten);
    }
    Ok(())
}
