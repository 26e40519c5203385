use super::*;
use pretty_assertions::assert_eq;

#[test]
fn changing_dataset_clears_other_filters() {
    let (mut state, _) = mounted(MIGRATION);
    user(&mut state, UserAction::SetLocations(vec![location("nsw")]));
    user(&mut state, UserAction::SetSubaction(Subaction::Raw));
    user(&mut state, UserAction::SetIndustries(vec!["mining".to_string()]));

    let effects = user(&mut state, UserAction::SetDatasetId(Some(TOURISM.to_string())));

    assert!(state.is_dirty);
    assert_eq!(state.filters.dataset_id.as_deref(), Some(TOURISM));
    assert!(state.filters.locations.is_empty());
    assert_eq!(state.filters.time_period, None);
    assert_eq!(state.filters.start_date, None);
    assert_eq!(state.filters.subaction, None);
    assert!(state.filter_set.is_empty());
    assert_eq!(state.dataset_metadata, None);
    assert!(effects.contains(&ViewEffect::LoadMetadata(TOURISM.to_string())));
    assert_eq!(
        fetch_ticket(&effects).map(|ticket| ticket.dataset_id),
        Some(TOURISM.to_string())
    );
    assert_eq!(persisted(&effects), Some(selection_for(TOURISM)));
}

#[test]
fn selecting_the_same_dataset_is_a_no_op() {
    let (mut state, _) = mounted(MIGRATION);
    user(&mut state, UserAction::SetLocations(vec![location("nsw")]));

    let effects = user(&mut state, UserAction::SetDatasetId(Some(MIGRATION.to_string())));

    assert!(effects.is_empty());
    assert_eq!(state.filters.locations, vec![location("nsw")]);
}

#[test]
fn metadata_resets_unsupported_visualization() {
    let (mut state, _) = mounted(MIGRATION);
    assert_eq!(state.filters.visualization_type, Some(VisualizationType::Chord));
    user(&mut state, UserAction::SetDatasetId(Some(TOURISM.to_string())));

    let effects = runtime(
        &mut state,
        RuntimeAction::SetDatasetMetadata(Some(metadata(TOURISM))),
    );

    assert_eq!(
        state.supported_visualizations,
        vec![VisualizationType::Bar, VisualizationType::Map]
    );
    assert_eq!(state.filters.visualization_type, Some(VisualizationType::Bar));
    assert_eq!(
        state.supported_subactions,
        vec![Subaction::MoveIn, Subaction::MoveOut, Subaction::Net]
    );
    assert_eq!(state.filters.start_date, Some(date(2021, 1, 1)));
    assert_eq!(state.filters.end_date, Some(date(2021, 3, 31)));
    assert_eq!(persisted(&effects), Some(state.filters.durable()));
    // The fetch started by the dataset change is still pending.
    assert_eq!(fetch_ticket(&effects), None);
}

#[test]
fn allow_list_narrows_supported_visualizations() {
    let mut state = ViewState::new(Some(vec![VisualizationType::Map]), true);
    bootstrap(&mut state, Some(selection_for(MIGRATION)), Some(metadata(MIGRATION)));

    assert_eq!(state.supported_visualizations, vec![VisualizationType::Map]);
    assert_eq!(state.filters.visualization_type, Some(VisualizationType::Map));

    let effects = user(
        &mut state,
        UserAction::SetVisualizationType(VisualizationType::Chord),
    );
    assert!(effects.is_empty());
    assert_eq!(state.filters.visualization_type, Some(VisualizationType::Map));
}

#[test]
fn metadata_for_another_dataset_is_discarded() {
    let (mut state, _) = mounted(MIGRATION);

    let effects = runtime(
        &mut state,
        RuntimeAction::SetDatasetMetadata(Some(metadata(TOURISM))),
    );

    assert!(effects.is_empty());
    assert_eq!(
        state.dataset_metadata.as_ref().map(|metadata| metadata.id.as_str()),
        Some(MIGRATION)
    );
}

#[test]
fn unsupported_subaction_is_rejected_and_logged() {
    let (mut state, _) = mounted(TOURISM);
    let logged = state.logs.len();

    let effects = user(&mut state, UserAction::SetSubaction(Subaction::Raw));

    assert!(effects.is_empty());
    assert_eq!(state.filters.subaction, None);
    assert_eq!(state.logs.len(), logged + 1);
    let last = state.logs.iter().last().expect("log entry");
    assert_eq!(last.level, LogLevel::Warn);
    assert_eq!(last.context.as_deref(), Some("subaction"));
}

#[test]
fn switching_visualization_drops_illegal_subaction() {
    let (mut state, _) = mounted(MIGRATION);
    user(&mut state, UserAction::SetSubaction(Subaction::Raw));
    assert_eq!(state.filter_set.subaction(), Some(Subaction::Raw));

    user(
        &mut state,
        UserAction::SetVisualizationType(VisualizationType::Bar),
    );

    assert_eq!(state.filters.subaction, None);
    assert!(!state.filter_set.contains_kind(FilterKind::Subaction));
    assert_eq!(
        state.supported_subactions,
        vec![Subaction::MoveIn, Subaction::MoveOut, Subaction::Net]
    );
}

#[test]
fn refinements_upsert_and_clear() {
    let (mut state, _) = mounted(MIGRATION);

    user(&mut state, UserAction::SetSubRegions(vec!["north".to_string()]));
    user(&mut state, UserAction::SetSubRegions(vec!["south".to_string()]));
    assert!(state.filter_set.contains_kind(FilterKind::SubRegion));
    assert_eq!(
        state
            .filter_set
            .iter()
            .filter(|filter| filter.kind() == FilterKind::SubRegion)
            .count(),
        1
    );

    user(&mut state, UserAction::SetSubRegions(Vec::new()));
    assert!(!state.filter_set.contains_kind(FilterKind::SubRegion));
    assert!(state.is_dirty);
}
