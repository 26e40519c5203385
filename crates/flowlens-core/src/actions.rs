use std::sync::Arc;

use chrono::NaiveDate;

use super::datasets::DatasetMetadata;
use super::datasets::Subaction;
use super::datasets::VisualizationType;
use super::filters::Location;
use super::periods::PeriodId;
use super::pipeline::MigrationRecord;
use super::state::DurableSelection;
use super::state::FetchTicket;
use super::state::LogEntry;

#[derive(Debug, Clone)]
pub enum ViewAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

impl ViewAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::User(action) => action.label(),
            Self::Runtime(action) => action.label(),
        }
    }
}

impl From<UserAction> for ViewAction {
    fn from(action: UserAction) -> Self {
        Self::User(action)
    }
}

impl From<RuntimeAction> for ViewAction {
    fn from(action: RuntimeAction) -> Self {
        Self::Runtime(action)
    }
}

#[derive(Debug, Clone)]
pub enum UserAction {
    SetLocations(Vec<Location>),
    /// Dates are only read for `PeriodId::Custom`; predefined periods are
    /// resolved against the dataset's reference year.
    SetTimePeriod {
        period_id: PeriodId,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    },
    SetVisualizationType(VisualizationType),
    SetSubaction(Subaction),
    SetDatasetId(Option<String>),
    SetIndustries(Vec<String>),
    SetSubRegions(Vec<String>),
    ToggleCollapse,
    Reset,
    Visualize,
    DismissValidation,
}

impl UserAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SetLocations(_) => "set-locations",
            Self::SetTimePeriod { .. } => "set-time-period",
            Self::SetVisualizationType(_) => "set-visualization-type",
            Self::SetSubaction(_) => "set-subaction",
            Self::SetDatasetId(_) => "set-dataset-id",
            Self::SetIndustries(_) => "set-industries",
            Self::SetSubRegions(_) => "set-sub-regions",
            Self::ToggleCollapse => "toggle-collapse",
            Self::Reset => "reset",
            Self::Visualize => "visualize",
            Self::DismissValidation => "dismiss-validation",
        }
    }
}

#[derive(Debug, Clone)]
pub enum RuntimeAction {
    Bootstrap {
        stored: Option<DurableSelection>,
        metadata: Option<DatasetMetadata>,
        today: NaiveDate,
    },
    SyncFromStore(DurableSelection),
    SetDatasetMetadata(Option<DatasetMetadata>),
    DatasetLoaded {
        ticket: FetchTicket,
        records: Arc<[MigrationRecord]>,
    },
    DatasetFailed {
        ticket: FetchTicket,
        message: String,
    },
    /// The debounced selection reached the durable store.
    SelectionCommitted,
    AppendLog(LogEntry),
}

impl RuntimeAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bootstrap { .. } => "bootstrap",
            Self::SyncFromStore(_) => "sync-from-store",
            Self::SetDatasetMetadata(_) => "set-dataset-metadata",
            Self::DatasetLoaded { .. } => "dataset-loaded",
            Self::DatasetFailed { .. } => "dataset-failed",
            Self::SelectionCommitted => "selection-committed",
            Self::AppendLog(_) => "append-log",
        }
    }
}
