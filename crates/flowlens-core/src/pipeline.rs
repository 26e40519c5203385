use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use crate::datasets::Subaction;
use crate::datasets::VisualizationType;
use crate::filters::Filter;
use crate::filters::FilterSet;

/// Key holding the period in a serialized `SeriesRow`. No location may use it.
pub const SERIES_PERIOD_KEY: &str = "period";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    pub period: NaiveDate,
    pub origin_id: String,
    pub destination_id: String,
    pub magnitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_region: Option<String>,
}

impl MigrationRecord {
    pub fn new(
        period: NaiveDate,
        origin_id: impl Into<String>,
        destination_id: impl Into<String>,
        magnitude: f64,
    ) -> Self {
        Self {
            period,
            origin_id: origin_id.into(),
            destination_id: destination_id.into(),
            magnitude,
            industry: None,
            sub_region: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowMatrix {
    pub matrix: Vec<Vec<f64>>,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    pub period: NaiveDate,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartData {
    Flow(FlowMatrix),
    Series(Vec<SeriesRow>),
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Flow(flow) => flow.names.is_empty(),
            Self::Series(rows) => rows.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    UnsupportedCombination {
        subaction: Subaction,
        visualization: VisualizationType,
    },
    MissingSubaction,
    ReservedLocationId(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedCombination {
                subaction,
                visualization,
            } => write!(
                f,
                "{} cannot be shown as a {}",
                subaction.label(),
                visualization.label().to_ascii_lowercase()
            ),
            Self::MissingSubaction => write!(f, "no subaction selected"),
            Self::ReservedLocationId(id) => {
                write!(f, "location id `{id}` clashes with the series period column")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// Outcome of the last pipeline run. `Empty` means the filters matched no
/// records; `NotRun` means nothing has been computed yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ChartStatus {
    #[default]
    NotRun,
    Loading,
    Empty,
    Ready(ChartData),
    Failed(String),
}

impl ChartStatus {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&ChartData> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NotRun => "not-run",
            Self::Loading => "loading",
            Self::Empty => "empty",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

enum Predicate<'a> {
    Locations(HashSet<&'a str>),
    Dates { start: NaiveDate, end: NaiveDate },
    Industries(HashSet<&'a str>),
    SubRegions(HashSet<&'a str>),
}

impl Predicate<'_> {
    // Lower ranks run first; location is usually the narrowest cut.
    fn rank(&self) -> u8 {
        match self {
            Self::Locations(_) => 0,
            Self::Dates { .. } => 1,
            Self::Industries(_) => 2,
            Self::SubRegions(_) => 3,
        }
    }

    fn matches(&self, record: &MigrationRecord) -> bool {
        match self {
            Self::Locations(ids) => {
                ids.contains(record.origin_id.as_str())
                    || ids.contains(record.destination_id.as_str())
            }
            Self::Dates { start, end } => *start <= record.period && record.period <= *end,
            Self::Industries(values) => record
                .industry
                .as_deref()
                .map_or(true, |industry| values.contains(industry)),
            Self::SubRegions(values) => record
                .sub_region
                .as_deref()
                .map_or(true, |region| values.contains(region)),
        }
    }
}

fn compile(filters: &[Filter]) -> Vec<Predicate<'_>> {
    let mut predicates: Vec<Predicate<'_>> = filters
        .iter()
        .filter_map(|filter| match filter {
            Filter::Location { locations, .. } => Some(Predicate::Locations(
                locations.iter().map(|location| location.id.as_str()).collect(),
            )),
            Filter::DateTime {
                start_date,
                end_date,
                ..
            } => Some(Predicate::Dates {
                start: *start_date,
                end: *end_date,
            }),
            Filter::Industry { industries, .. } => Some(Predicate::Industries(
                industries.iter().map(String::as_str).collect(),
            )),
            Filter::SubRegion { sub_regions, .. } => Some(Predicate::SubRegions(
                sub_regions.iter().map(String::as_str).collect(),
            )),
            Filter::Subaction { .. } => None,
        })
        .collect();
    predicates.sort_by_key(|predicate| predicate.rank());
    predicates
}

/// Keeps records that satisfy every active filter. Values inside one filter
/// are alternatives; different filters must all hold.
pub fn apply(dataset: &[MigrationRecord], filters: &[Filter]) -> Vec<MigrationRecord> {
    let predicates = compile(filters);
    dataset
        .iter()
        .filter(|record| predicates.iter().all(|predicate| predicate.matches(record)))
        .cloned()
        .collect()
}

pub fn reshape(
    records: &[MigrationRecord],
    subaction: Subaction,
    visualization: VisualizationType,
    focus: &[String],
) -> Result<ChartData, PipelineError> {
    match (subaction, visualization) {
        (Subaction::Raw, VisualizationType::Chord) => Ok(ChartData::Flow(flow_matrix(records))),
        (
            Subaction::MoveIn | Subaction::MoveOut | Subaction::Net,
            VisualizationType::Bar | VisualizationType::Map,
        ) => {
            let rows = period_series(records, subaction, focus);
            if rows
                .iter()
                .any(|row| row.values.contains_key(SERIES_PERIOD_KEY))
            {
                return Err(PipelineError::ReservedLocationId(
                    SERIES_PERIOD_KEY.to_string(),
                ));
            }
            Ok(ChartData::Series(rows))
        }
        _ => Err(PipelineError::UnsupportedCombination {
            subaction,
            visualization,
        }),
    }
}

/// Filters and reshapes in one step, folding the outcome into a status.
pub fn run(
    dataset: &[MigrationRecord],
    filters: &FilterSet,
    visualization: VisualizationType,
) -> ChartStatus {
    let Some(subaction) = filters.subaction() else {
        return ChartStatus::Failed(PipelineError::MissingSubaction.to_string());
    };
    let records = apply(dataset, filters.as_slice());
    tracing::debug!(
        input = dataset.len(),
        kept = records.len(),
        subaction = subaction.as_str(),
        visualization = visualization.as_str(),
        "filter pipeline applied"
    );
    if records.is_empty() {
        return ChartStatus::Empty;
    }
    match reshape(&records, subaction, visualization, &filters.location_ids()) {
        Ok(data) if data.is_empty() => ChartStatus::Empty,
        Ok(data) => ChartStatus::Ready(data),
        Err(err) => ChartStatus::Failed(err.to_string()),
    }
}

fn flow_matrix(records: &[MigrationRecord]) -> FlowMatrix {
    let mut names: Vec<String> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in records {
        for id in [record.origin_id.as_str(), record.destination_id.as_str()] {
            if !index.contains_key(id) {
                index.insert(id, names.len());
                names.push(id.to_string());
            }
        }
    }

    let mut matrix = vec![vec![0.0; names.len()]; names.len()];
    for record in records {
        let row = index[record.origin_id.as_str()];
        let col = index[record.destination_id.as_str()];
        matrix[row][col] += record.magnitude;
    }
    FlowMatrix { matrix, names }
}

fn period_series(
    records: &[MigrationRecord],
    subaction: Subaction,
    focus: &[String],
) -> Vec<SeriesRow> {
    let columns: Vec<String> = if focus.is_empty() {
        let mut seen = BTreeSet::new();
        for record in records {
            if subaction != Subaction::MoveOut {
                seen.insert(record.destination_id.clone());
            }
            if subaction != Subaction::MoveIn {
                seen.insert(record.origin_id.clone());
            }
        }
        seen.into_iter().collect()
    } else {
        focus.to_vec()
    };

    let mut grouped: BTreeMap<NaiveDate, BTreeMap<String, f64>> = BTreeMap::new();
    for record in records {
        let row = grouped.entry(record.period).or_insert_with(|| {
            columns
                .iter()
                .map(|column| (column.clone(), 0.0))
                .collect()
        });
        let inbound = matches!(subaction, Subaction::MoveIn | Subaction::Net);
        let outbound = matches!(subaction, Subaction::MoveOut | Subaction::Net);
        if inbound {
            if let Some(value) = row.get_mut(record.destination_id.as_str()) {
                *value += record.magnitude;
            }
        }
        if outbound {
            if let Some(value) = row.get_mut(record.origin_id.as_str()) {
                if subaction == Subaction::Net {
                    *value -= record.magnitude;
                } else {
                    *value += record.magnitude;
                }
            }
        }
    }

    grouped
        .into_iter()
        .map(|(period, values)| SeriesRow { period, values })
        .collect()
}
