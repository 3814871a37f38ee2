//! Implements StatePort using a JSON file.
//!
//! Tracks the tracker-sync cursor (last applied server `modified`
//! timestamp) for incremental sync.

use crate::domain::DomainError;
use crate::ports::StatePort;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateData {
    tracker_cursor: Option<String>,
}

/// JSON file-based state storage.
pub struct StateJson {
    path: std::path::PathBuf,
    cache: tokio::sync::RwLock<StateData>,
}

impl StateJson {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: tokio::sync::RwLock::new(StateData::default()),
        }
    }

    /// Load state from disk. Call after construction or when path changes.
    pub async fn load(&self) -> Result<(), DomainError> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
            Err(_) => StateData::default(),
        };
        *self.cache.write().await = data;
        Ok(())
    }

    /// Atomic save using write-replace:
    /// 1. Write to temp file
    /// 2. sync_all() to ensure flush to disk
    /// 3. Atomic rename to target path
    /// A crash mid-write leaves the previous cursor intact, which only
    /// causes a harmless re-sync.
    async fn save(&self) -> Result<(), DomainError> {
        let data = self.cache.read().await;
        let json =
            serde_json::to_string_pretty(&*data).map_err(|e| DomainError::State(e.to_string()))?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::State(format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| DomainError::State(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::State(format!("sync temp file: {}", e)))?;
        drop(f); // Close file handle before rename

        // Atomic on POSIX; on Windows it's as close as we can get
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| DomainError::State(format!("atomic rename failed: {}", e)))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl StatePort for StateJson {
    async fn get_tracker_cursor(&self) -> Result<Option<String>, DomainError> {
        let cache = self.cache.read().await;
        Ok(cache.tracker_cursor.clone())
    }

    async fn set_tracker_cursor(&self, cursor: &str) -> Result<(), DomainError> {
        {
            let mut cache = self.cache.write().await;
            cache.tracker_cursor = Some(cursor.to_string());
        }
        self.save().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cursor_survives_reload() {
        let path = std::env::temp_dir().join(format!("crm-sync-state-reload-{}.json", std::process::id()));
        let _ = tokio::fs::remove_file(&path).await;

        let state = StateJson::new(&path);
        state.load().await.unwrap();
        assert_eq!(state.get_tracker_cursor().await.unwrap(), None);

        state
            .set_tracker_cursor("2025-06-01 10:00:00.000001")
            .await
            .unwrap();

        let reloaded = StateJson::new(&path);
        reloaded.load().await.unwrap();
        assert_eq!(
            reloaded.get_tracker_cursor().await.unwrap().as_deref(),
            Some("2025-06-01 10:00:00.000001")
        );

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_state() {
        let path = std::env::temp_dir().join(format!("crm-sync-state-missing-{}.json", std::process::id()));
        let _ = tokio::fs::remove_file(&path).await;

        let state = StateJson::new(&path);
        state.load().await.unwrap();
        assert_eq!(state.get_tracker_cursor().await.unwrap(), None);
    }
}
