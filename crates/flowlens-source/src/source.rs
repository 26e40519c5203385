use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use flowlens_core::DatasetRegistry;
use flowlens_core::MigrationRecord;

use crate::contracts::parse_records;
use crate::contracts::DatasetFile;
use crate::error::SourceError;

/// Dataset-fetch collaborator. Returns records in file order.
pub trait DatasetSource {
    fn fetch(&self, dataset_id: &str) -> Result<Vec<MigrationRecord>, SourceError>;
}

/// Reads `<root>/<source_path>` for datasets known to the registry.
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    root: PathBuf,
}

impl JsonDirectorySource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, dataset_id: &str) -> Result<PathBuf, SourceError> {
        DatasetRegistry::get(dataset_id)
            .map(|spec| self.root.join(spec.source_path))
            .ok_or_else(|| SourceError::UnknownDataset(dataset_id.to_string()))
    }
}

impl DatasetSource for JsonDirectorySource {
    fn fetch(&self, dataset_id: &str) -> Result<Vec<MigrationRecord>, SourceError> {
        let path = self.path_for(dataset_id)?;
        let bytes = std::fs::read(&path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        let file: DatasetFile =
            serde_json::from_slice(&bytes).map_err(|source| SourceError::Parse {
                path: path.clone(),
                source,
            })?;
        let records = parse_records(file.into_records())?;
        tracing::debug!(dataset = dataset_id, path = %path.display(), records = records.len(), "dataset read");
        Ok(records)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    datasets: HashMap<String, Vec<MigrationRecord>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, dataset_id: impl Into<String>, records: Vec<MigrationRecord>) -> Self {
        self.datasets.insert(dataset_id.into(), records);
        self
    }
}

impl DatasetSource for InMemorySource {
    fn fetch(&self, dataset_id: &str) -> Result<Vec<MigrationRecord>, SourceError> {
        self.datasets
            .get(dataset_id)
            .cloned()
            .ok_or_else(|| SourceError::UnknownDataset(dataset_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn reads_registered_dataset_file() {
        let dir = tempdir().expect("tmpdir");
        std::fs::write(
            dir.path().join("interstate-migration.json"),
            r#"[
                {"period":"2020-01","origin":"nsw","destination":"vic","value":5},
                {"period":"2020-Q2","origin":"vic","destination":"nsw","value":2,"industry":"mining"}
            ]"#,
        )
        .expect("write");

        let source = JsonDirectorySource::new(dir.path());
        let records = source.fetch("interstate-migration").expect("fetch");

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].industry.as_deref(), Some("mining"));
        assert_eq!(records[1].period.to_string(), "2020-04-01");
    }

    #[test]
    fn unknown_and_missing_datasets_are_distinct_errors() {
        let dir = tempdir().expect("tmpdir");
        let source = JsonDirectorySource::new(dir.path());

        assert!(matches!(
            source.fetch("no-such-dataset"),
            Err(SourceError::UnknownDataset(_))
        ));
        assert!(matches!(
            source.fetch("regional-tourism"),
            Err(SourceError::Io { .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = tempdir().expect("tmpdir");
        std::fs::write(dir.path().join("regional-tourism.json"), "{").expect("write");
        let err = JsonDirectorySource::new(dir.path())
            .fetch("regional-tourism")
            .expect_err("parse");
        assert!(matches!(err, SourceError::Parse { .. }));
        assert!(err.to_string().contains("regional-tourism.json"));
    }

    #[test]
    fn in_memory_source_serves_registered_records() {
        let source = InMemorySource::new().with_dataset("x", Vec::new());
        assert_eq!(source.fetch("x").expect("fetch"), Vec::new());
        assert!(source.fetch("y").is_err());
    }
}
