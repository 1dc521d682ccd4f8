//! Connection registry.
//!
//! Holds the name → DSN mapping in memory and mirrors it to a JSON file.
//! The file is read once at startup and rewritten in full on every save.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::RwLock;

use common::errors::{AppError, AppResult};
use common::models::connection::RegistryState;

/// In-memory connection registry backed by a JSON file.
///
/// Saves hold the write lock across the file rewrite, so concurrent saves
/// are serialized and the file always holds one complete mapping.
pub struct ConnectionRegistry {
    /// Location of the persisted mapping.
    path: PathBuf,
    state: RwLock<RegistryState>,
}

impl ConnectionRegistry {
    /// Creates a registry and loads any previously persisted connections.
    ///
    /// A missing file yields an empty registry. An unreadable or malformed
    /// file is logged and also yields an empty registry.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let connections = match read_connections(&path).await {
            Ok(Some(connections)) => {
                tracing::info!(count = connections.len(), path = %path.display(), "Loaded saved connections");
                connections
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "No connections file found, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unusable connections file");
                BTreeMap::new()
            }
        };

        Self {
            path,
            state: RwLock::new(RegistryState {
                connections,
                selected: None,
            }),
        }
    }

    /// Registers `name` → `dsn`, overwriting any previous DSN for `name`.
    ///
    /// On success the entry becomes the selected connection and the whole
    /// mapping is written to disk. A failed write is logged, not returned.
    pub async fn save(&self, name: &str, dsn: &str) -> AppResult<()> {
        if name.is_empty() || dsn.is_empty() {
            return Err(AppError::Validation("Name and DSN are required".into()));
        }

        let mut state = self.state.write().await;
        let replaced = state
            .connections
            .insert(name.to_string(), dsn.to_string())
            .is_some();
        state.selected = Some(name.to_string());

        if let Err(e) = write_connections(&self.path, &state.connections).await {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to persist connections");
        }

        tracing::info!(name = %name, replaced, "Saved connection");
        Ok(())
    }

    /// Looks up the DSN registered under `name`.
    pub async fn resolve(&self, name: &str) -> AppResult<String> {
        self.state
            .read()
            .await
            .connections
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::ConnectionNotFound(name.to_string()))
    }

    /// Snapshot of the registry for rendering.
    pub async fn list(&self) -> RegistryState {
        self.state.read().await.clone()
    }

    /// Number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.len()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reads the persisted mapping. `Ok(None)` when the file does not exist.
async fn read_connections(path: &Path) -> AppResult<Option<BTreeMap<String, String>>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AppError::Persistence(format!("Error reading connections file: {}", e)));
        }
    };

    let mut connections: BTreeMap<String, String> = serde_json::from_str(&content)
        .map_err(|e| AppError::Persistence(format!("Error parsing connections file: {}", e)))?;

    connections.retain(|name, dsn| {
        let keep = !name.is_empty() && !dsn.is_empty();
        if !keep {
            tracing::warn!(name = %name, "Dropping saved connection with empty name or DSN");
        }
        keep
    });

    Ok(Some(connections))
}

/// Rewrites the whole mapping as indented JSON.
async fn write_connections(path: &Path, connections: &BTreeMap<String, String>) -> AppResult<()> {
    let data = serde_json::to_string_pretty(connections)
        .map_err(|e| AppError::Persistence(format!("Error encoding connections: {}", e)))?;
    tokio::fs::write(path, data)
        .await
        .map_err(|e| AppError::Persistence(format!("Error writing connections file: {}", e)))
}
