use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::datasets::VisualizationType;
use crate::geometry::GeometryConfig;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub view: ViewConfig,
    pub geometry: GeometryConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    pub debounce_ms: u64,
    pub allowed_visualizations: Option<Vec<VisualizationType>>,
    pub default_dataset: Option<String>,
    pub month_granularity: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1_000,
            allowed_visualizations: None,
            default_dataset: None,
            month_granularity: true,
        }
    }
}

impl ViewConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub selection_path: Option<PathBuf>,
}

impl DashboardConfig {
    /// Reads TOML, or YAML for `.yaml`/`.yml` files. A missing file yields
    /// the defaults.
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        if is_yaml {
            Self::from_yaml_str(&raw)
        } else {
            Self::from_toml_str(&raw)
        }
    }

    pub fn from_toml_str(raw: &str) -> std::io::Result<Self> {
        toml::from_str(raw).map_err(|err| std::io::Error::other(format!("parse config: {err}")))
    }

    pub fn from_yaml_str(raw: &str) -> std::io::Result<Self> {
        serde_yaml::from_str(raw).map_err(|err| std::io::Error::other(format!("parse config: {err}")))
    }
}
