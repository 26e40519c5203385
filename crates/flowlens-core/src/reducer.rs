#[derive(Debug, Clone, PartialEq)]
pub enum ViewEffect {
    /// Hand the durable part of the selection to the debouncer.
    PersistSelection(DurableSelection),
    LoadMetadata(String),
    FetchDataset(FetchTicket),
    ShowValidation(String),
    RequestRender,
}

use super::actions::RuntimeAction;
use super::actions::UserAction;
use super::actions::ViewAction;
use super::datasets::supported_subactions;
use super::datasets::supported_visualizations;
use super::datasets::DatasetMetadata;
use super::datasets::Subaction;
use super::datasets::VisualizationType;
use super::filters::Filter;
use super::filters::FilterKind;
use super::filters::FilterSet;
use super::filters::Location;
use super::periods::last_three_months;
use super::periods::reference_year;
use super::periods::resolve_period_at;
use super::periods::time_periods;
use super::periods::PeriodId;
use super::pipeline;
use super::pipeline::ChartStatus;
use super::state::validate;
use super::state::DurableSelection;
use super::state::FetchTicket;
use super::state::Lifecycle;
use super::state::LoadedDataset;
use super::state::LogEntry;
use super::state::LogLevel;
use super::state::LogSource;
use super::state::ViewState;
use super::state::VisualizationFilters;
use super::state::VisualizationRequest;

pub fn reduce(state: &mut ViewState, action: ViewAction) -> Vec<ViewEffect> {
    match action {
        ViewAction::Runtime(RuntimeAction::Bootstrap {
            stored,
            metadata,
            today,
        }) => bootstrap(state, stored, metadata, today),
        action if !state.is_bootstrapped() => {
            tracing::warn!(action = action.label(), "action dropped before bootstrap");
            Vec::new()
        }
        ViewAction::User(user) => reduce_user(state, user),
        ViewAction::Runtime(runtime) => reduce_runtime(state, runtime),
    }
}

fn bootstrap(
    state: &mut ViewState,
    stored: Option<DurableSelection>,
    metadata: Option<DatasetMetadata>,
    today: chrono::NaiveDate,
) -> Vec<ViewEffect> {
    if state.is_bootstrapped() {
        tracing::debug!("bootstrap ignored; view already mounted");
        return Vec::new();
    }
    state.lifecycle = Lifecycle::Bootstrapped;
    state.today = today;

    let stored = stored.unwrap_or_default();
    state.filters.apply_durable(&stored);
    let mut effects = Vec::new();

    let metadata = match metadata {
        Some(metadata) if state.filters.dataset_id.is_none() => {
            state.filters.dataset_id = Some(metadata.id.clone());
            Some(metadata)
        }
        Some(metadata) if state.filters.dataset_id.as_deref() == Some(metadata.id.as_str()) => {
            Some(metadata)
        }
        _ => {
            if let Some(dataset_id) = state.filters.dataset_id.clone() {
                effects.push(ViewEffect::LoadMetadata(dataset_id));
            }
            None
        }
    };
    apply_metadata(state, metadata);

    if state.filters.date_range().is_none() {
        state
            .filters
            .set_date_range(PeriodId::Custom, last_three_months(state.today));
    }
    rebuild_filter_set(state);
    state.initial = Some(state.filters.clone());
    state.is_dirty = false;

    let message = format!(
        "mounted with dataset {}",
        state.filters.dataset_id.as_deref().unwrap_or("<none>")
    );
    push_log(state, LogLevel::Info, LogSource::View, "bootstrap", message);

    effects.extend(start_fetch(state));
    let durable = state.filters.durable();
    if durable != stored {
        effects.push(ViewEffect::PersistSelection(durable));
    }
    effects.push(ViewEffect::RequestRender);
    effects
}

fn reduce_user(state: &mut ViewState, action: UserAction) -> Vec<ViewEffect> {
    match action {
        UserAction::SetLocations(locations) => {
            state.filters.locations = dedupe_locations(locations);
            filters_changed(state)
        }
        UserAction::SetTimePeriod {
            period_id,
            start_date,
            end_date,
        } => {
            let year = reference_year(state.dataset_metadata.as_ref(), state.today);
            let range = resolve_period_at(
                period_id,
                year,
                effective_month_granularity(state),
                start_date,
                end_date,
                state.today,
            );
            state.filters.set_date_range(period_id, range);
            filters_changed(state)
        }
        UserAction::SetVisualizationType(visualization) => {
            if !visualization_allowed(state, visualization) {
                reject(state, "visualization", visualization.as_str());
                return Vec::new();
            }
            state.filters.visualization_type = Some(visualization);
            refresh_subactions(state);
            let effects = filters_changed(state);
            rerun_local(state);
            effects
        }
        UserAction::SetSubaction(subaction) => {
            if !subaction_allowed(state, subaction) {
                reject(state, "subaction", subaction.as_str());
                return Vec::new();
            }
            state.filters.subaction = Some(subaction);
            let effects = filters_changed(state);
            rerun_local(state);
            effects
        }
        UserAction::SetDatasetId(dataset_id) => {
            if dataset_id == state.filters.dataset_id {
                return Vec::new();
            }
            change_dataset(state, dataset_id)
        }
        UserAction::SetIndustries(industries) => {
            state.filter_set = if industries.is_empty() {
                state.filter_set.remove_kind(FilterKind::Industry)
            } else {
                state.filter_set.upsert(Filter::industries(industries))
            };
            state.is_dirty = true;
            refresh_chart(state);
            vec![ViewEffect::RequestRender]
        }
        UserAction::SetSubRegions(sub_regions) => {
            state.filter_set = if sub_regions.is_empty() {
                state.filter_set.remove_kind(FilterKind::SubRegion)
            } else {
                state.filter_set.upsert(Filter::sub_regions(sub_regions))
            };
            state.is_dirty = true;
            refresh_chart(state);
            vec![ViewEffect::RequestRender]
        }
        UserAction::ToggleCollapse => {
            state.is_collapsed = !state.is_collapsed;
            vec![ViewEffect::RequestRender]
        }
        UserAction::Reset => reset(state),
        UserAction::Visualize => visualize(state),
        UserAction::DismissValidation => {
            if state.validation_message.take().is_some() {
                return vec![ViewEffect::RequestRender];
            }
            Vec::new()
        }
    }
}

fn reduce_runtime(state: &mut ViewState, action: RuntimeAction) -> Vec<ViewEffect> {
    match action {
        RuntimeAction::Bootstrap { .. } => Vec::new(),
        RuntimeAction::SyncFromStore(selection) => {
            let previous_dataset = state.filters.dataset_id.clone();
            state.filters.apply_durable(&selection);
            let dataset_changed = state.filters.dataset_id != previous_dataset;
            if dataset_changed {
                apply_metadata(state, None);
            }
            rebuild_filter_set(state);

            let mut effects = Vec::new();
            if dataset_changed {
                if let Some(dataset_id) = state.filters.dataset_id.clone() {
                    effects.push(ViewEffect::LoadMetadata(dataset_id));
                }
                effects.extend(start_fetch(state));
            }
            rerun_active(state);
            effects.push(ViewEffect::RequestRender);
            effects
        }
        RuntimeAction::SetDatasetMetadata(metadata) => {
            if let Some(metadata) = metadata.as_ref() {
                if state.filters.dataset_id.as_deref() != Some(metadata.id.as_str()) {
                    tracing::debug!(dataset = %metadata.id, "stale metadata discarded");
                    return Vec::new();
                }
            }
            let before = state.filters.durable();
            apply_metadata(state, metadata);
            rebuild_filter_set(state);

            let mut effects = Vec::new();
            let loaded_or_pending = state.filters.dataset_id.as_deref().is_some_and(|id| {
                state.loaded_dataset_id() == Some(id)
                    || state
                        .pending_fetch
                        .as_ref()
                        .is_some_and(|ticket| ticket.dataset_id == id)
            });
            if !loaded_or_pending {
                effects.extend(start_fetch(state));
            }
            let durable = state.filters.durable();
            if durable != before {
                effects.push(ViewEffect::PersistSelection(durable));
            }
            effects.push(ViewEffect::RequestRender);
            effects
        }
        RuntimeAction::DatasetLoaded { ticket, records } => {
            if !is_current_ticket(state, &ticket) {
                push_log(
                    state,
                    LogLevel::Debug,
                    LogSource::Fetch,
                    "stale",
                    format!("discarded result for {} (#{})", ticket.dataset_id, ticket.seq),
                );
                return Vec::new();
            }
            push_log(
                state,
                LogLevel::Info,
                LogSource::Fetch,
                "loaded",
                format!("{} records for {}", records.len(), ticket.dataset_id),
            );
            state.pending_fetch = None;
            state.is_loading = false;
            state.dataset = Some(LoadedDataset {
                dataset_id: ticket.dataset_id,
                records,
            });
            if state.active.is_some() {
                refresh_chart(state);
            }
            vec![ViewEffect::RequestRender]
        }
        RuntimeAction::DatasetFailed { ticket, message } => {
            if !is_current_ticket(state, &ticket) {
                tracing::debug!(dataset = %ticket.dataset_id, seq = ticket.seq, "stale failure discarded");
                return Vec::new();
            }
            push_log(
                state,
                LogLevel::Error,
                LogSource::Fetch,
                "failed",
                format!("{}: {message}", ticket.dataset_id),
            );
            state.pending_fetch = None;
            state.is_loading = false;
            state.chart = ChartStatus::Failed(message);
            vec![ViewEffect::RequestRender]
        }
        RuntimeAction::SelectionCommitted => {
            if state.active.is_none() {
                return Vec::new();
            }
            rerun_active(state);
            vec![ViewEffect::RequestRender]
        }
        RuntimeAction::AppendLog(entry) => {
            state.logs.append(entry);
            Vec::new()
        }
    }
}

fn change_dataset(state: &mut ViewState, dataset_id: Option<String>) -> Vec<ViewEffect> {
    let visualization_type = state.filters.visualization_type;
    state.filters = VisualizationFilters {
        dataset_id: dataset_id.clone(),
        visualization_type,
        ..VisualizationFilters::default()
    };
    state.filter_set = FilterSet::clear();
    state.dataset = None;
    state.active = None;
    state.chart = ChartStatus::NotRun;
    state.validation_message = None;
    state.is_dirty = true;
    apply_metadata(state, None);

    tracing::info!(dataset = dataset_id.as_deref().unwrap_or("<none>"), "dataset changed");
    let mut effects = vec![ViewEffect::PersistSelection(state.filters.durable())];
    if let Some(dataset_id) = dataset_id {
        effects.push(ViewEffect::LoadMetadata(dataset_id));
    }
    effects.extend(start_fetch(state));
    effects.push(ViewEffect::RequestRender);
    effects
}

fn reset(state: &mut ViewState) -> Vec<ViewEffect> {
    let Some(initial) = state.initial.clone() else {
        return Vec::new();
    };
    let before = state.filters.durable();
    let dataset_changed = initial.dataset_id != state.filters.dataset_id;
    state.filters = initial;
    state.filter_set = FilterSet::clear();
    state.active = None;
    state.chart = ChartStatus::NotRun;
    state.validation_message = None;
    state.is_dirty = false;

    let mut effects = Vec::new();
    if dataset_changed {
        state.dataset = None;
        apply_metadata(state, None);
        if let Some(dataset_id) = state.filters.dataset_id.clone() {
            effects.push(ViewEffect::LoadMetadata(dataset_id));
        }
        effects.extend(start_fetch(state));
    } else {
        refresh_subactions(state);
    }
    rebuild_filter_set(state);

    let durable = state.filters.durable();
    if durable != before {
        effects.push(ViewEffect::PersistSelection(durable));
    }
    effects.push(ViewEffect::RequestRender);
    effects
}

fn visualize(state: &mut ViewState) -> Vec<ViewEffect> {
    let request = match validate(&state.filters) {
        Ok(request) => request,
        Err(err) => {
            let message = err.message().to_string();
            push_log(
                state,
                LogLevel::Warn,
                LogSource::View,
                "validation",
                message.clone(),
            );
            state.validation_message = Some(message.clone());
            return vec![ViewEffect::ShowValidation(message), ViewEffect::RequestRender];
        }
    };

    state.validation_message = None;
    state.is_dirty = false;
    let mut effects = Vec::new();
    let needs_fetch = state.loaded_dataset_id() != Some(request.dataset_id.as_str())
        && state
            .pending_fetch
            .as_ref()
            .map_or(true, |ticket| ticket.dataset_id != request.dataset_id);
    state.active = Some(request);
    if needs_fetch {
        effects.extend(start_fetch(state));
    }
    refresh_chart(state);
    effects.push(ViewEffect::RequestRender);
    effects
}

/// Re-validates the committed selection for an active chart and recomputes
/// it. An incomplete selection leaves the last chart in place.
fn rerun_active(state: &mut ViewState) {
    if state.active.is_none() {
        return;
    }
    if let Ok(request) = validate(&state.filters) {
        state.active = Some(request);
        refresh_chart(state);
    }
}

/// Re-runs an active chart after a visualization or subaction edit. Those
/// fields never pass through the store, so they apply at once; locations
/// and dates stay as last committed.
fn rerun_local(state: &mut ViewState) {
    let Some(active) = state.active.as_ref() else {
        return;
    };
    let (Some(visualization), Some(subaction)) =
        (state.filters.visualization_type, state.filters.subaction)
    else {
        return;
    };
    if active.visualization == visualization && active.subaction == subaction {
        return;
    }
    state.active = Some(VisualizationRequest {
        visualization,
        subaction,
        ..active.clone()
    });
    refresh_chart(state);
}

fn refresh_chart(state: &mut ViewState) {
    let Some(active) = state.active.as_ref() else {
        return;
    };
    let visualization = active.visualization;
    let chart = match state.dataset.as_ref() {
        Some(dataset) if dataset.dataset_id == active.dataset_id => pipeline::run(
            &dataset.records,
            &request_filters(active, &state.filter_set),
            visualization,
        ),
        _ => ChartStatus::Loading,
    };
    let level = if chart.error().is_some() {
        LogLevel::Warn
    } else {
        LogLevel::Debug
    };
    let label = chart.label();
    state.chart = chart;
    push_log(
        state,
        level,
        LogSource::Pipeline,
        visualization.as_str(),
        format!("chart {label}"),
    );
}

/// Predicates for a validated request. Only the industry and sub-region
/// refinements come from the live collection.
fn request_filters(request: &VisualizationRequest, live: &FilterSet) -> FilterSet {
    let mut set = FilterSet::new()
        .upsert(Filter::locations(request.locations.clone()))
        .upsert(Filter::date_time(request.time_period, request.range))
        .upsert(Filter::subaction(request.subaction));
    for kind in [FilterKind::Industry, FilterKind::SubRegion] {
        if let Some(filter) = live.get(kind) {
            set = set.upsert(filter.clone());
        }
    }
    set
}

fn filters_changed(state: &mut ViewState) -> Vec<ViewEffect> {
    state.is_dirty = true;
    rebuild_filter_set(state);
    vec![
        ViewEffect::PersistSelection(state.filters.durable()),
        ViewEffect::RequestRender,
    ]
}

fn start_fetch(state: &mut ViewState) -> Option<ViewEffect> {
    let Some(dataset_id) = state.filters.dataset_id.clone() else {
        state.pending_fetch = None;
        state.is_loading = false;
        return None;
    };
    let ticket = FetchTicket {
        dataset_id,
        seq: state.next_fetch_seq,
    };
    state.next_fetch_seq += 1;
    state.pending_fetch = Some(ticket.clone());
    state.is_loading = true;
    Some(ViewEffect::FetchDataset(ticket))
}

fn is_current_ticket(state: &ViewState, ticket: &FetchTicket) -> bool {
    if state.filters.dataset_id.as_deref() != Some(ticket.dataset_id.as_str()) {
        return false;
    }
    state
        .pending_fetch
        .as_ref()
        .is_some_and(|pending| pending.dataset_id == ticket.dataset_id && ticket.seq >= pending.seq)
}

fn apply_metadata(state: &mut ViewState, metadata: Option<DatasetMetadata>) {
    state.supported_visualizations = metadata
        .as_ref()
        .map(|metadata| supported_visualizations(metadata, state.allow_list.as_deref()))
        .unwrap_or_default();
    state.time_periods = time_periods(metadata.as_ref(), state.today);
    state.dataset_metadata = metadata;

    if state.dataset_metadata.is_some() {
        let current = state.filters.visualization_type;
        if current.map_or(true, |viz| !state.supported_visualizations.contains(&viz)) {
            state.filters.visualization_type = state.supported_visualizations.first().copied();
        }
    }
    refresh_subactions(state);

    if state.filters.date_range().is_none() {
        if let Some(default_period) = state
            .dataset_metadata
            .as_ref()
            .map(|metadata| metadata.default_period)
        {
            let year = reference_year(state.dataset_metadata.as_ref(), state.today);
            let range = resolve_period_at(
                default_period,
                year,
                effective_month_granularity(state),
                None,
                None,
                state.today,
            );
            state.filters.set_date_range(default_period, range);
        }
    }
}

fn refresh_subactions(state: &mut ViewState) {
    state.supported_subactions = match (
        state.dataset_metadata.as_ref(),
        state.filters.visualization_type,
    ) {
        (Some(metadata), Some(visualization)) => supported_subactions(metadata, visualization),
        (Some(metadata), None) => metadata.supported_subactions.clone(),
        (None, _) => Vec::new(),
    };
    if state.dataset_metadata.is_some()
        && state
            .filters
            .subaction
            .is_some_and(|subaction| !state.supported_subactions.contains(&subaction))
    {
        state.filters.subaction = None;
    }
}

/// Mirrors the selection into the filter collection. Industry and
/// sub-region refinements live only in the collection and are kept.
fn rebuild_filter_set(state: &mut ViewState) {
    let filters = &state.filters;
    let mut set = state.filter_set.clone();
    set = if filters.locations.is_empty() {
        set.remove_kind(FilterKind::Location)
    } else {
        set.upsert(Filter::locations(filters.locations.clone()))
    };
    set = match filters.date_range() {
        Some(range) => set.upsert(Filter::date_time(
            filters.time_period.unwrap_or(PeriodId::Custom),
            range,
        )),
        None => set.remove_kind(FilterKind::DateTime),
    };
    set = match filters.subaction {
        Some(subaction) => set.upsert(Filter::subaction(subaction)),
        None => set.remove_kind(FilterKind::Subaction),
    };
    state.filter_set = set;
}

fn effective_month_granularity(state: &ViewState) -> bool {
    state.month_granularity
        && state
            .dataset_metadata
            .as_ref()
            .map_or(true, |metadata| metadata.month_granularity)
}

fn visualization_allowed(state: &ViewState, visualization: VisualizationType) -> bool {
    if state.dataset_metadata.is_some() {
        return state.supported_visualizations.contains(&visualization);
    }
    state
        .allow_list
        .as_ref()
        .map_or(true, |allowed| allowed.contains(&visualization))
}

fn subaction_allowed(state: &ViewState, subaction: Subaction) -> bool {
    state.dataset_metadata.is_none() || state.supported_subactions.contains(&subaction)
}

fn dedupe_locations(locations: Vec<Location>) -> Vec<Location> {
    let mut seen = std::collections::HashSet::new();
    locations
        .into_iter()
        .filter(|location| seen.insert(location.id.clone()))
        .collect()
}

fn reject(state: &mut ViewState, field: &str, value: &str) {
    push_log(
        state,
        LogLevel::Warn,
        LogSource::View,
        field,
        format!("{value} is not supported by the current dataset"),
    );
}

fn push_log(
    state: &mut ViewState,
    level: LogLevel,
    source: LogSource,
    context: &str,
    message: String,
) {
    match level {
        LogLevel::Debug => tracing::debug!(context, "{message}"),
        LogLevel::Info => tracing::info!(context, "{message}"),
        LogLevel::Warn => tracing::warn!(context, "{message}"),
        LogLevel::Error => tracing::error!(context, "{message}"),
    }
    state.logs.append(LogEntry {
        seq: 0,
        level,
        source,
        context: Some(context.to_string()),
        message,
    });
}

#[cfg(test)]
mod tests;
