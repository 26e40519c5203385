use std::collections::VecDeque;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use crate::datasets::DatasetMetadata;
use crate::datasets::Subaction;
use crate::datasets::VisualizationType;
use crate::filters::FilterSet;
use crate::filters::Location;
use crate::periods::DateRange;
use crate::periods::PeriodId;
use crate::periods::TimePeriod;
use crate::pipeline::ChartStatus;
use crate::pipeline::MigrationRecord;

pub const LOG_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Bootstrapped,
}

/// The part of the selection that outlives a view. Local-only fields have
/// no place here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DurableSelection {
    pub locations: Vec<Location>,
    pub time_period: Option<PeriodId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub dataset_id: Option<String>,
}

impl DurableSelection {
    pub fn has_date_range(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_some()
    }
}

/// The selection being edited. Fields are optional while the user builds
/// it; `validate` turns a complete one into a `VisualizationRequest`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationFilters {
    pub locations: Vec<Location>,
    pub time_period: Option<PeriodId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub visualization_type: Option<VisualizationType>,
    pub subaction: Option<Subaction>,
    pub dataset_id: Option<String>,
}

impl VisualizationFilters {
    pub fn durable(&self) -> DurableSelection {
        DurableSelection {
            locations: self.locations.clone(),
            time_period: self.time_period,
            start_date: self.start_date,
            end_date: self.end_date,
            dataset_id: self.dataset_id.clone(),
        }
    }

    /// Overwrites only the mirrored fields.
    pub fn apply_durable(&mut self, selection: &DurableSelection) {
        self.locations = selection.locations.clone();
        self.time_period = selection.time_period;
        self.start_date = selection.start_date;
        self.end_date = selection.end_date;
        self.dataset_id = selection.dataset_id.clone();
    }

    pub fn date_range(&self) -> Option<DateRange> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            _ => None,
        }
    }

    pub fn set_date_range(&mut self, period_id: PeriodId, range: DateRange) {
        self.time_period = Some(period_id);
        self.start_date = Some(range.start_date);
        self.end_date = Some(range.end_date);
    }
}

/// A fully populated selection, the only shape the pipeline accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationRequest {
    pub dataset_id: String,
    pub subaction: Subaction,
    pub visualization: VisualizationType,
    pub time_period: PeriodId,
    pub range: DateRange,
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingDataset,
    MissingSubaction,
    MissingVisualization,
    MissingDateRange,
    MissingLocations,
}

impl ValidationError {
    pub fn message(self) -> &'static str {
        match self {
            Self::MissingDataset => "Select a dataset before visualizing.",
            Self::MissingSubaction => {
                "Select what to measure: move in, move out, net or raw flows."
            }
            Self::MissingVisualization => "Select a visualization type.",
            Self::MissingDateRange => "Select a time period with both a start and an end date.",
            Self::MissingLocations => "Select at least one location.",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Checks requirements in a fixed order and reports the first one missing.
pub fn validate(filters: &VisualizationFilters) -> Result<VisualizationRequest, ValidationError> {
    let dataset_id = filters
        .dataset_id
        .clone()
        .ok_or(ValidationError::MissingDataset)?;
    let subaction = filters.subaction.ok_or(ValidationError::MissingSubaction)?;
    let visualization = filters
        .visualization_type
        .ok_or(ValidationError::MissingVisualization)?;
    let range = filters.date_range().ok_or(ValidationError::MissingDateRange)?;
    if filters.locations.is_empty() {
        return Err(ValidationError::MissingLocations);
    }
    Ok(VisualizationRequest {
        dataset_id,
        subaction,
        visualization,
        time_period: filters.time_period.unwrap_or(PeriodId::Custom),
        range,
        locations: filters.locations.clone(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTicket {
    pub dataset_id: String,
    pub seq: u64,
}

#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset_id: String,
    pub records: Arc<[MigrationRecord]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    View,
    Pipeline,
    Fetch,
    Store,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub seq: u64,
    pub level: LogLevel,
    pub source: LogSource,
    pub context: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct LogBuffer {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<LogEntry>,
}

impl LogBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            next_seq: 1,
            buf: VecDeque::with_capacity(cap),
        }
    }

    pub fn append(&mut self, mut entry: LogEntry) {
        entry.seq = self.next_seq;
        self.next_seq += 1;

        if self.cap == 0 {
            return;
        }
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.next_seq = 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.buf.iter()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub lifecycle: Lifecycle,
    pub today: NaiveDate,
    pub filters: VisualizationFilters,
    pub filter_set: FilterSet,
    pub initial: Option<VisualizationFilters>,
    pub dataset_metadata: Option<DatasetMetadata>,
    pub supported_visualizations: Vec<VisualizationType>,
    pub supported_subactions: Vec<Subaction>,
    pub time_periods: Vec<TimePeriod>,
    pub allow_list: Option<Vec<VisualizationType>>,
    pub month_granularity: bool,
    pub is_dirty: bool,
    pub is_loading: bool,
    pub is_collapsed: bool,
    pub dataset: Option<LoadedDataset>,
    pub pending_fetch: Option<FetchTicket>,
    pub next_fetch_seq: u64,
    pub active: Option<VisualizationRequest>,
    pub chart: ChartStatus,
    pub validation_message: Option<String>,
    pub logs: LogBuffer,
}

impl ViewState {
    pub fn new(allow_list: Option<Vec<VisualizationType>>, month_granularity: bool) -> Self {
        Self {
            lifecycle: Lifecycle::Uninitialized,
            today: NaiveDate::default(),
            filters: VisualizationFilters::default(),
            filter_set: FilterSet::new(),
            initial: None,
            dataset_metadata: None,
            supported_visualizations: Vec::new(),
            supported_subactions: Vec::new(),
            time_periods: Vec::new(),
            allow_list,
            month_granularity,
            is_dirty: false,
            is_loading: false,
            is_collapsed: false,
            dataset: None,
            pending_fetch: None,
            next_fetch_seq: 1,
            active: None,
            chart: ChartStatus::NotRun,
            validation_message: None,
            logs: LogBuffer::new(LOG_CAPACITY),
        }
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.lifecycle == Lifecycle::Bootstrapped
    }

    pub fn loaded_dataset_id(&self) -> Option<&str> {
        self.dataset.as_ref().map(|dataset| dataset.dataset_id.as_str())
    }

    /// Display-only summary of the selected period.
    pub fn period_summary(&self) -> Option<String> {
        self.filters.date_range().map(|range| range.summary())
    }
}
