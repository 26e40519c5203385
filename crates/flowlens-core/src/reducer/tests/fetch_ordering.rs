use super::*;
use pretty_assertions::assert_eq;

#[test]
fn late_result_for_previous_dataset_is_discarded() {
    let (mut state, effects) = mounted(MIGRATION);
    let first = fetch_ticket(&effects).expect("first fetch");
    let effects = user(&mut state, UserAction::SetDatasetId(Some(TOURISM.to_string())));
    let second = fetch_ticket(&effects).expect("second fetch");

    assert!(load(&mut state, first).is_empty());
    assert_eq!(state.loaded_dataset_id(), None);
    assert_eq!(state.pending_fetch.as_ref(), Some(&second));
    assert!(state.is_loading);

    assert_eq!(load(&mut state, second), vec![ViewEffect::RequestRender]);
    assert_eq!(state.loaded_dataset_id(), Some(TOURISM));
    assert!(!state.is_loading);
}

#[test]
fn older_fetch_for_same_dataset_id_is_discarded() {
    let (mut state, effects) = mounted(MIGRATION);
    let stale = fetch_ticket(&effects).expect("first fetch");
    user(&mut state, UserAction::SetDatasetId(Some(TOURISM.to_string())));
    let effects = user(&mut state, UserAction::SetDatasetId(Some(MIGRATION.to_string())));
    let current = fetch_ticket(&effects).expect("current fetch");
    assert!(current.seq > stale.seq);

    assert!(load(&mut state, stale).is_empty());
    assert_eq!(state.loaded_dataset_id(), None);
    assert!(state
        .logs
        .iter()
        .any(|entry| entry.source == LogSource::Fetch && entry.context.as_deref() == Some("stale")));
}

#[test]
fn failed_fetch_sets_error_status() {
    let (mut state, effects) = mounted(MIGRATION);
    let ticket = fetch_ticket(&effects).expect("fetch");

    runtime(
        &mut state,
        RuntimeAction::DatasetFailed {
            ticket,
            message: "connection reset".to_string(),
        },
    );

    assert_eq!(state.chart.error(), Some("connection reset"));
    assert!(!state.chart.is_empty());
    assert!(!state.is_loading);
    assert_eq!(state.pending_fetch, None);
}

#[test]
fn stale_failure_does_not_touch_chart() {
    let (mut state, effects) = mounted(MIGRATION);
    let stale = fetch_ticket(&effects).expect("fetch");
    user(&mut state, UserAction::SetDatasetId(Some(TOURISM.to_string())));

    let effects = runtime(
        &mut state,
        RuntimeAction::DatasetFailed {
            ticket: stale,
            message: "timeout".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.chart, ChartStatus::NotRun);
}

#[test]
fn committed_selection_reruns_active_chart() {
    let (mut state, effects) = mounted(MIGRATION);
    load(&mut state, fetch_ticket(&effects).expect("fetch"));
    user(&mut state, UserAction::SetLocations(vec![location("b")]));
    user(&mut state, UserAction::SetSubaction(Subaction::Raw));
    user(&mut state, UserAction::Visualize);
    let Some(ChartData::Flow(before)) = state.chart.data().cloned() else {
        panic!("expected flow matrix");
    };
    assert_eq!(before.names, vec!["a".to_string(), "b".to_string()]);

    user(&mut state, UserAction::SetLocations(vec![location("c")]));
    assert_eq!(state.chart.data(), Some(&ChartData::Flow(before)));

    let effects = runtime(&mut state, RuntimeAction::SelectionCommitted);
    assert_eq!(effects, vec![ViewEffect::RequestRender]);
    let Some(ChartData::Flow(after)) = state.chart.data() else {
        panic!("expected flow matrix");
    };
    assert_eq!(after.names, vec!["c".to_string(), "a".to_string()]);
    assert_eq!(after.matrix, vec![vec![0.0, 7.0], vec![0.0, 0.0]]);
}

#[test]
fn commit_without_active_chart_is_quiet() {
    let (mut state, _) = mounted(MIGRATION);
    assert!(runtime(&mut state, RuntimeAction::SelectionCommitted).is_empty());
    assert_eq!(state.chart, ChartStatus::NotRun);
}

#[test]
fn late_load_uses_the_visualized_request() {
    let (mut state, effects) = mounted(MIGRATION);
    let ticket = fetch_ticket(&effects).expect("fetch");
    user(&mut state, UserAction::SetLocations(vec![location("a")]));
    user(&mut state, UserAction::SetSubaction(Subaction::Raw));
    user(&mut state, UserAction::Visualize);
    assert_eq!(state.chart, ChartStatus::Loading);

    user(
        &mut state,
        UserAction::SetVisualizationType(VisualizationType::Bar),
    );
    assert_eq!(state.filters.subaction, None);

    load(&mut state, ticket);

    let active = state.active.as_ref().expect("active request");
    assert_eq!(active.visualization, VisualizationType::Chord);
    assert_eq!(active.subaction, Subaction::Raw);
    let Some(ChartData::Flow(flow)) = state.chart.data() else {
        panic!("expected flow matrix, got {:?}", state.chart);
    };
    assert_eq!(
        flow.names,
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
}

#[test]
fn refinements_rerun_active_chart() {
    let (mut state, effects) = mounted(MIGRATION);
    let ticket = fetch_ticket(&effects).expect("fetch");
    let mut mining = MigrationRecord::new(date(2019, 1, 1), "a", "b", 10.0);
    mining.industry = Some("mining".to_string());
    let mut retail = MigrationRecord::new(date(2019, 1, 1), "b", "a", 4.0);
    retail.industry = Some("retail".to_string());
    runtime(
        &mut state,
        RuntimeAction::DatasetLoaded {
            ticket,
            records: vec![mining, retail].into(),
        },
    );
    user(&mut state, UserAction::SetLocations(vec![location("a")]));
    user(&mut state, UserAction::SetSubaction(Subaction::Raw));
    user(&mut state, UserAction::Visualize);
    let matrix = |state: &ViewState| match state.chart.data() {
        Some(ChartData::Flow(flow)) => flow.matrix.clone(),
        other => panic!("expected flow matrix, got {other:?}"),
    };
    assert_eq!(matrix(&state), vec![vec![0.0, 10.0], vec![4.0, 0.0]]);

    let effects = user(&mut state, UserAction::SetIndustries(vec!["mining".to_string()]));
    assert_eq!(effects, vec![ViewEffect::RequestRender]);
    assert_eq!(matrix(&state), vec![vec![0.0, 10.0], vec![0.0, 0.0]]);

    user(&mut state, UserAction::SetIndustries(Vec::new()));
    assert_eq!(matrix(&state), vec![vec![0.0, 10.0], vec![4.0, 0.0]]);
}

#[test]
fn subaction_edit_reruns_with_committed_locations() {
    let (mut state, effects) = mounted(MIGRATION);
    load(&mut state, fetch_ticket(&effects).expect("fetch"));
    user(&mut state, UserAction::SetLocations(vec![location("a")]));
    user(&mut state, UserAction::SetSubaction(Subaction::Raw));
    user(&mut state, UserAction::Visualize);

    user(
        &mut state,
        UserAction::SetVisualizationType(VisualizationType::Bar),
    );
    assert!(matches!(state.chart.data(), Some(ChartData::Flow(_))));

    user(&mut state, UserAction::SetLocations(vec![location("c")]));
    user(&mut state, UserAction::SetSubaction(Subaction::MoveIn));

    let active = state.active.as_ref().expect("active request");
    assert_eq!(active.visualization, VisualizationType::Bar);
    assert_eq!(active.subaction, Subaction::MoveIn);
    assert_eq!(active.locations, vec![location("a")]);
    let Some(ChartData::Series(rows)) = state.chart.data() else {
        panic!("expected series, got {:?}", state.chart);
    };
    for row in rows {
        assert_eq!(row.values.keys().cloned().collect::<Vec<_>>(), vec!["a".to_string()]);
    }
}
