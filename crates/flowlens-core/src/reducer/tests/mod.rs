use std::sync::Arc;

use chrono::NaiveDate;

pub(super) use super::reduce;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::actions::ViewAction;
pub(super) use crate::datasets::DatasetMetadata;
pub(super) use crate::datasets::DatasetRegistry;
pub(super) use crate::datasets::Subaction;
pub(super) use crate::datasets::VisualizationType;
pub(super) use crate::filters::FilterKind;
pub(super) use crate::filters::Location;
pub(super) use crate::periods::PeriodId;
pub(super) use crate::pipeline::ChartData;
pub(super) use crate::pipeline::ChartStatus;
pub(super) use crate::pipeline::MigrationRecord;
pub(super) use crate::reducer::ViewEffect;
pub(super) use crate::state::DurableSelection;
pub(super) use crate::state::FetchTicket;
pub(super) use crate::state::LogBuffer;
pub(super) use crate::state::LogEntry;
pub(super) use crate::state::LogLevel;
pub(super) use crate::state::LogSource;
pub(super) use crate::state::ValidationError;
pub(super) use crate::state::ViewState;

mod dataset_changes;
mod fetch_ordering;
mod lifecycle;
mod validation;

const MIGRATION: &str = "interstate-migration";
const TOURISM: &str = "regional-tourism";

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn today() -> NaiveDate {
    date(2024, 5, 15)
}

fn state() -> ViewState {
    ViewState::new(None, true)
}

fn metadata(dataset_id: &str) -> DatasetMetadata {
    DatasetRegistry::capabilities_for(dataset_id).expect("registered dataset")
}

fn location(id: &str) -> Location {
    Location::new(id, id.to_uppercase())
}

fn selection_for(dataset_id: &str) -> DurableSelection {
    DurableSelection {
        dataset_id: Some(dataset_id.to_string()),
        ..DurableSelection::default()
    }
}

fn bootstrap(
    state: &mut ViewState,
    stored: Option<DurableSelection>,
    metadata: Option<DatasetMetadata>,
) -> Vec<ViewEffect> {
    reduce(
        state,
        ViewAction::Runtime(RuntimeAction::Bootstrap {
            stored,
            metadata,
            today: today(),
        }),
    )
}

/// A view mounted on `dataset_id` with its metadata already resolved.
fn mounted(dataset_id: &str) -> (ViewState, Vec<ViewEffect>) {
    let mut state = state();
    let effects = bootstrap(
        &mut state,
        Some(selection_for(dataset_id)),
        Some(metadata(dataset_id)),
    );
    (state, effects)
}

fn user(state: &mut ViewState, action: UserAction) -> Vec<ViewEffect> {
    reduce(state, ViewAction::User(action))
}

fn runtime(state: &mut ViewState, action: RuntimeAction) -> Vec<ViewEffect> {
    reduce(state, ViewAction::Runtime(action))
}

fn fetch_ticket(effects: &[ViewEffect]) -> Option<FetchTicket> {
    effects.iter().find_map(|effect| match effect {
        ViewEffect::FetchDataset(ticket) => Some(ticket.clone()),
        _ => None,
    })
}

fn persisted(effects: &[ViewEffect]) -> Option<DurableSelection> {
    effects.iter().find_map(|effect| match effect {
        ViewEffect::PersistSelection(selection) => Some(selection.clone()),
        _ => None,
    })
}

fn records() -> Arc<[MigrationRecord]> {
    vec![
        MigrationRecord::new(date(2019, 1, 1), "a", "b", 10.0),
        MigrationRecord::new(date(2019, 1, 1), "b", "a", 4.0),
        MigrationRecord::new(date(2019, 1, 1), "a", "a", 2.0),
        MigrationRecord::new(date(2019, 2, 1), "c", "a", 7.0),
    ]
    .into()
}

fn load(state: &mut ViewState, ticket: FetchTicket) -> Vec<ViewEffect> {
    runtime(
        state,
        RuntimeAction::DatasetLoaded {
            ticket,
            records: records(),
        },
    )
}
