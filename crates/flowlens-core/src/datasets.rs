use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use crate::periods::PeriodId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationType {
    Chord,
    Bar,
    Map,
}

impl VisualizationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chord => "chord",
            Self::Bar => "bar",
            Self::Map => "map",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Chord => "Flow diagram",
            Self::Bar => "Bar chart",
            Self::Map => "Map",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chord" => Some(Self::Chord),
            "bar" => Some(Self::Bar),
            "map" => Some(Self::Map),
            _ => None,
        }
    }

    /// Subactions that have a chart shape for this visualization.
    pub fn shape_subactions(self) -> &'static [Subaction] {
        match self {
            Self::Chord => &[Subaction::Raw],
            Self::Bar | Self::Map => &[Subaction::MoveIn, Subaction::MoveOut, Subaction::Net],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subaction {
    MoveIn,
    MoveOut,
    Net,
    Raw,
}

impl Subaction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MoveIn => "movein",
            Self::MoveOut => "moveout",
            Self::Net => "net",
            Self::Raw => "raw",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::MoveIn => "Move in",
            Self::MoveOut => "Move out",
            Self::Net => "Net",
            Self::Raw => "Raw flows",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "movein" | "move-in" => Some(Self::MoveIn),
            "moveout" | "move-out" => Some(Self::MoveOut),
            "net" => Some(Self::Net),
            "raw" => Some(Self::Raw),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageSpec {
    pub start: (i32, u32),
    pub end: (i32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub source_path: &'static str,
    pub visualizations: &'static [VisualizationType],
    pub subactions: &'static [Subaction],
    pub default_period: PeriodId,
    pub month_granularity: bool,
    pub coverage: Option<CoverageSpec>,
}

/// Capabilities of one dataset, resolved from its static spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub id: String,
    pub title: String,
    pub source_path: String,
    pub supported_visualizations: Vec<VisualizationType>,
    pub supported_subactions: Vec<Subaction>,
    pub default_period: PeriodId,
    pub month_granularity: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DatasetMetadata {
    pub fn supports_visualization(&self, visualization: VisualizationType) -> bool {
        self.supported_visualizations.contains(&visualization)
    }

    pub fn supports_subaction(&self, subaction: Subaction) -> bool {
        self.supported_subactions.contains(&subaction)
    }
}

pub struct DatasetRegistry;

const DATASET_SPECS: [DatasetSpec; 3] = [
    DatasetSpec {
        id: "interstate-migration",
        title: "Interstate migration",
        source_path: "interstate-migration.json",
        visualizations: &[
            VisualizationType::Chord,
            VisualizationType::Bar,
            VisualizationType::Map,
        ],
        subactions: &[
            Subaction::MoveIn,
            Subaction::MoveOut,
            Subaction::Net,
            Subaction::Raw,
        ],
        default_period: PeriodId::FullYear,
        month_granularity: true,
        coverage: Some(CoverageSpec {
            start: (2019, 1),
            end: (2023, 12),
        }),
    },
    DatasetSpec {
        id: "regional-tourism",
        title: "Regional tourism",
        source_path: "regional-tourism.json",
        visualizations: &[VisualizationType::Bar, VisualizationType::Map],
        subactions: &[Subaction::MoveIn, Subaction::MoveOut, Subaction::Net],
        default_period: PeriodId::Q1,
        month_granularity: true,
        coverage: Some(CoverageSpec {
            start: (2021, 1),
            end: (2023, 6),
        }),
    },
    DatasetSpec {
        id: "workforce-commute",
        title: "Workforce commuting by industry",
        source_path: "workforce-commute.json",
        visualizations: &[VisualizationType::Chord, VisualizationType::Bar],
        subactions: &[Subaction::Net, Subaction::Raw],
        default_period: PeriodId::FullYear,
        month_granularity: false,
        coverage: None,
    },
];

impl DatasetRegistry {
    pub fn list() -> &'static [DatasetSpec] {
        &DATASET_SPECS
    }

    pub fn get(dataset_id: &str) -> Option<&'static DatasetSpec> {
        DATASET_SPECS.iter().find(|spec| spec.id == dataset_id)
    }

    /// Returns `None` for unknown ids so callers can show a neutral placeholder.
    pub fn capabilities_for(dataset_id: &str) -> Option<DatasetMetadata> {
        Self::get(dataset_id).map(metadata_from_spec)
    }
}

pub fn metadata_from_spec(spec: &DatasetSpec) -> DatasetMetadata {
    let (start_date, end_date) = match spec.coverage {
        Some(coverage) => (
            NaiveDate::from_ymd_opt(coverage.start.0, coverage.start.1, 1),
            month_end(coverage.end.0, coverage.end.1),
        ),
        None => (None, None),
    };
    DatasetMetadata {
        id: spec.id.to_string(),
        title: spec.title.to_string(),
        source_path: spec.source_path.to_string(),
        supported_visualizations: spec.visualizations.to_vec(),
        supported_subactions: spec.subactions.to_vec(),
        default_period: spec.default_period,
        month_granularity: spec.month_granularity,
        start_date,
        end_date,
    }
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    crate::periods::last_day_of_month(first)
}

/// Intersection of the dataset's visualizations and the view allow-list,
/// in dataset order.
pub fn supported_visualizations(
    metadata: &DatasetMetadata,
    allow_list: Option<&[VisualizationType]>,
) -> Vec<VisualizationType> {
    metadata
        .supported_visualizations
        .iter()
        .copied()
        .filter(|visualization| allow_list.map_or(true, |allowed| allowed.contains(visualization)))
        .collect()
}

/// Subactions selectable for `visualization` on this dataset.
pub fn supported_subactions(
    metadata: &DatasetMetadata,
    visualization: VisualizationType,
) -> Vec<Subaction> {
    visualization
        .shape_subactions()
        .iter()
        .copied()
        .filter(|subaction| metadata.supports_subaction(*subaction))
        .collect()
}
