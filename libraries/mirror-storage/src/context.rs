use crate::versions;
use async_trait::async_trait;
use mirror_core::{error::Result, VersionEntry, VersionStore};
use sqlx::SqlitePool;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

/// Durable version index backed by `SQLite`
///
/// Writes from all launchers pass through one async mutex, so a
/// `clear_latest` for one launcher never interleaves with an `update` for
/// another. Reads go straight to the pool.
pub struct VersionIndex {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl VersionIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Latest version of `launcher`, or an empty string if none is recorded
    pub async fn get_latest_version(&self, launcher: &str) -> Result<String> {
        Ok(self.latest_version(launcher).await?.unwrap_or_default())
    }
}

#[async_trait]
impl VersionStore for VersionIndex {
    async fn clear_latest(&self, launcher: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let cleared = versions::clear_latest(&self.pool, launcher).await?;
        debug!(launcher = %launcher, cleared, "Cleared latest flags");
        Ok(())
    }

    async fn update(&self, launcher: &str, version: &str, manifest_path: &Path) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        versions::upsert_latest(&self.pool, launcher, version, manifest_path).await?;
        debug!(launcher = %launcher, version = %version, "Recorded latest version");
        Ok(())
    }

    async fn latest_version(&self, launcher: &str) -> Result<Option<String>> {
        Ok(versions::get_latest(&self.pool, launcher)
            .await?
            .map(|entry| entry.version))
    }

    async fn history(&self, launcher: &str) -> Result<Vec<VersionEntry>> {
        Ok(versions::get_by_launcher(&self.pool, launcher).await?)
    }
}
