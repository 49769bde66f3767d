use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use super::StateSnapshot;

/// One row of the host's entity registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegistryEntry {
    pub entity_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RegistryEntry {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            platform: None,
            name: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to read entity registry {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse entity registry: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Entity registry unavailable: {0}")]
    Unavailable(String),
}

/// Host query listing every registered entity.
///
/// This is the only asynchronous collaborator of the card. A failed query is
/// never retried; callers keep whatever they listed before.
#[async_trait]
pub trait EntityRegistry: Send + Sync {
    async fn list_entities(&self) -> Result<Vec<RegistryEntry>, RegistryError>;
}

/// Registry derived from the ids present in a state snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotRegistry {
    snapshot: Arc<StateSnapshot>,
}

impl SnapshotRegistry {
    pub fn new(snapshot: Arc<StateSnapshot>) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl EntityRegistry for SnapshotRegistry {
    async fn list_entities(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        let mut entries: Vec<RegistryEntry> =
            self.snapshot.entity_ids().map(RegistryEntry::new).collect();
        entries.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        Ok(entries)
    }
}

/// On-disk registry layouts: Home Assistant's `core.entity_registry` storage
/// file, or a bare list of entries.
#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryDocument {
    Storage { data: RegistryData },
    List(Vec<RegistryEntry>),
}

#[derive(Deserialize)]
struct RegistryData {
    entities: Vec<RegistryEntry>,
}

/// Registry read from a JSON dump on every query.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EntityRegistry for FileRegistry {
    async fn list_entities(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| RegistryError::Io(self.path.clone(), e))?;

        Ok(match serde_json::from_str::<RegistryDocument>(&json)? {
            RegistryDocument::Storage { data } => data.entities,
            RegistryDocument::List(entries) => entries,
        })
    }
}

/// Registry returning a fixed result, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockRegistry {
    pub entries: Vec<RegistryEntry>,
    pub fail: bool,
}

#[cfg(test)]
impl MockRegistry {
    pub fn with_ids(ids: &[&str]) -> Self {
        Self {
            entries: ids.iter().map(|id| RegistryEntry::new(*id)).collect(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            entries: Vec::new(),
            fail: true,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl EntityRegistry for MockRegistry {
    async fn list_entities(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        if self.fail {
            return Err(RegistryError::Unavailable("mock failure".to_string()));
        }
        Ok(self.entries.clone())
    }
}
