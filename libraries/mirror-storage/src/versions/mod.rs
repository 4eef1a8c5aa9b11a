//! Version index queries
//!
//! Plain query functions over the `versions` table. Callers that need the
//! single-writer guarantee go through [`crate::VersionIndex`].

use crate::error::{Result, StorageError};
use mirror_core::VersionEntry;
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};

/// Clear the latest flag on every entry of a launcher
///
/// Returns the number of entries that were flagged latest.
pub async fn clear_latest(pool: &SqlitePool, launcher: &str) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE versions SET is_latest = 0, updated_at = ?
         WHERE launcher = ? AND is_latest = 1",
    )
    .bind(chrono::Utc::now().timestamp())
    .bind(launcher)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Insert or refresh a version entry and flag it latest
pub async fn upsert_latest(
    pool: &SqlitePool,
    launcher: &str,
    version: &str,
    manifest_path: &Path,
) -> Result<()> {
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO versions (launcher, version, manifest_path, is_latest, created_at, updated_at)
         VALUES (?, ?, ?, 1, ?, ?)
         ON CONFLICT(launcher, version) DO UPDATE SET
            manifest_path = excluded.manifest_path,
            is_latest = 1,
            updated_at = excluded.updated_at",
    )
    .bind(launcher)
    .bind(version)
    .bind(manifest_path.to_string_lossy().to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Version currently flagged latest for a launcher
///
/// If an interrupted promotion left more than one flag set, the most
/// recently written entry wins.
pub async fn get_latest(pool: &SqlitePool, launcher: &str) -> Result<Option<VersionEntry>> {
    let row = sqlx::query(
        "SELECT launcher, version, manifest_path, is_latest, created_at
         FROM versions
         WHERE launcher = ? AND is_latest = 1
         ORDER BY updated_at DESC, created_at DESC
         LIMIT 1",
    )
    .bind(launcher)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(entry_from_row).transpose()
}

/// All entries of a launcher, newest first
pub async fn get_by_launcher(pool: &SqlitePool, launcher: &str) -> Result<Vec<VersionEntry>> {
    let rows = sqlx::query(
        "SELECT launcher, version, manifest_path, is_latest, created_at
         FROM versions
         WHERE launcher = ?
         ORDER BY created_at DESC, rowid DESC",
    )
    .bind(launcher)
    .fetch_all(pool)
    .await?;

    rows.iter().map(entry_from_row).collect()
}

/// Number of entries flagged latest for a launcher
pub async fn count_latest(pool: &SqlitePool, launcher: &str) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM versions WHERE launcher = ? AND is_latest = 1")
            .bind(launcher)
            .fetch_one(pool)
            .await?;

    Ok(count)
}

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<VersionEntry> {
    let created_at = row.get::<i64, _>("created_at");

    Ok(VersionEntry {
        launcher: row.get("launcher"),
        version: row.get("version"),
        manifest_path: PathBuf::from(row.get::<String, _>("manifest_path")),
        is_latest: row.get::<i64, _>("is_latest") != 0,
        created_at: chrono::DateTime::from_timestamp(created_at, 0)
            .ok_or_else(|| StorageError::InvalidData(format!("timestamp {created_at}")))?,
    })
}
