use super::*;
use pretty_assertions::assert_eq;

#[test]
fn actions_before_bootstrap_are_dropped() {
    let mut state = state();
    let effects = user(&mut state, UserAction::SetLocations(vec![location("nsw")]));

    assert!(effects.is_empty());
    assert!(state.filters.locations.is_empty());
    assert!(!state.is_dirty);
}

#[test]
fn bootstrap_runs_once_per_mount() {
    let (mut state, _) = mounted(MIGRATION);
    let before = state.filters.clone();

    let effects = bootstrap(&mut state, Some(selection_for(TOURISM)), Some(metadata(TOURISM)));

    assert!(effects.is_empty());
    assert_eq!(state.filters, before);
    assert_eq!(state.initial.as_ref(), Some(&before));
}

#[test]
fn bootstrap_keeps_stored_date_range() {
    let stored = DurableSelection {
        locations: vec![location("nsw")],
        time_period: Some(PeriodId::Q2),
        start_date: Some(date(2020, 4, 1)),
        end_date: Some(date(2020, 6, 30)),
        dataset_id: Some(MIGRATION.to_string()),
    };
    let mut state = state();
    let effects = bootstrap(&mut state, Some(stored.clone()), Some(metadata(MIGRATION)));

    assert_eq!(state.filters.durable(), stored);
    assert_eq!(persisted(&effects), None);
    assert_eq!(
        fetch_ticket(&effects),
        Some(FetchTicket {
            dataset_id: MIGRATION.to_string(),
            seq: 1,
        })
    );
    assert!(state.is_loading);
}

#[test]
fn bootstrap_fills_dataset_default_period() {
    let (state, effects) = mounted(MIGRATION);

    assert_eq!(state.filters.time_period, Some(PeriodId::FullYear));
    assert_eq!(state.filters.start_date, Some(date(2019, 1, 1)));
    assert_eq!(state.filters.end_date, Some(date(2019, 12, 31)));
    assert_eq!(persisted(&effects), Some(state.filters.durable()));
    assert!(!state.is_dirty);
}

#[test]
fn bootstrap_without_metadata_falls_back_to_last_three_months() {
    let mut state = state();
    let effects = bootstrap(&mut state, None, None);

    assert_eq!(state.filters.time_period, Some(PeriodId::Custom));
    assert_eq!(state.filters.start_date, Some(date(2024, 2, 15)));
    assert_eq!(state.filters.end_date, Some(date(2024, 5, 15)));
    assert_eq!(fetch_ticket(&effects), None);
    assert_eq!(state.initial.as_ref(), Some(&state.filters));
}

#[test]
fn bootstrap_with_stored_dataset_but_no_metadata_requests_it() {
    let mut state = state();
    let effects = bootstrap(&mut state, Some(selection_for(TOURISM)), None);

    assert!(effects.contains(&ViewEffect::LoadMetadata(TOURISM.to_string())));
    assert_eq!(state.dataset_metadata, None);
    assert!(state.supported_visualizations.is_empty());
}

#[test]
fn metadata_alone_selects_its_dataset() {
    let mut state = state();
    bootstrap(&mut state, None, Some(metadata(TOURISM)));

    assert_eq!(state.filters.dataset_id.as_deref(), Some(TOURISM));
    assert_eq!(state.filters.time_period, Some(PeriodId::Q1));
    assert_eq!(state.filters.start_date, Some(date(2021, 1, 1)));
    assert_eq!(state.filters.end_date, Some(date(2021, 3, 31)));
}

#[test]
fn toggle_collapse_is_view_only() {
    let (mut state, _) = mounted(MIGRATION);
    let durable = state.filters.durable();

    let effects = user(&mut state, UserAction::ToggleCollapse);

    assert_eq!(effects, vec![ViewEffect::RequestRender]);
    assert!(state.is_collapsed);
    assert!(!state.is_dirty);
    assert_eq!(state.filters.durable(), durable);

    user(&mut state, UserAction::ToggleCollapse);
    assert!(!state.is_collapsed);
}
