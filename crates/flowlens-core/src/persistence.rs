use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::state::DurableSelection;

pub const SELECTION_SNAPSHOT_V1: u32 = 1;

/// Durable key-value collaborator holding the last committed selection.
pub trait SelectionStore {
    fn get(&self) -> std::io::Result<Option<DurableSelection>>;
    fn set(&mut self, selection: &DurableSelection) -> std::io::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSelectionSnapshot {
    pub version: u32,
    pub revision: u64,
    pub saved_at_ms: i64,
    pub selection: DurableSelection,
}

#[derive(Debug)]
pub struct FileSelectionStore {
    path: PathBuf,
    revision: u64,
}

impl FileSelectionStore {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let revision = load_snapshot(&path)?.map_or(0, |snapshot| snapshot.revision);
        Ok(Self { path, revision })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn load_snapshot(&self) -> std::io::Result<Option<PersistedSelectionSnapshot>> {
        load_snapshot(&self.path)
    }
}

impl SelectionStore for FileSelectionStore {
    fn get(&self) -> std::io::Result<Option<DurableSelection>> {
        Ok(self.load_snapshot()?.map(|snapshot| snapshot.selection))
    }

    fn set(&mut self, selection: &DurableSelection) -> std::io::Result<()> {
        let revision = self.revision.saturating_add(1);
        let snapshot = PersistedSelectionSnapshot {
            version: SELECTION_SNAPSHOT_V1,
            revision,
            saved_at_ms: chrono::Utc::now().timestamp_millis(),
            selection: selection.clone(),
        };
        let encoded = serde_json::to_vec_pretty(&snapshot)
            .map_err(|err| std::io::Error::other(format!("serialize selection: {err}")))?;
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, encoded)?;
        std::fs::rename(&staging, &self.path)?;
        self.revision = revision;
        tracing::debug!(path = %self.path.display(), revision, "selection written");
        Ok(())
    }
}

fn load_snapshot(path: &Path) -> std::io::Result<Option<PersistedSelectionSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    let snapshot = serde_json::from_slice::<PersistedSelectionSnapshot>(&bytes)
        .map_err(|err| std::io::Error::other(format!("parse selection: {err}")))?;
    if snapshot.version != SELECTION_SNAPSHOT_V1 {
        return Err(std::io::Error::other(format!(
            "unsupported selection snapshot version {}",
            snapshot.version
        )));
    }
    Ok(Some(snapshot))
}

/// In-memory store that records every write.
#[derive(Debug, Clone, Default)]
pub struct MemorySelectionStore {
    value: Option<DurableSelection>,
    history: Vec<DurableSelection>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(selection: DurableSelection) -> Self {
        Self {
            value: Some(selection),
            history: Vec::new(),
        }
    }

    pub fn writes(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &[DurableSelection] {
        &self.history
    }
}

impl SelectionStore for MemorySelectionStore {
    fn get(&self) -> std::io::Result<Option<DurableSelection>> {
        Ok(self.value.clone())
    }

    fn set(&mut self, selection: &DurableSelection) -> std::io::Result<()> {
        self.value = Some(selection.clone());
        self.history.push(selection.clone());
        Ok(())
    }
}
