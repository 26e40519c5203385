use super::*;
use pretty_assertions::assert_eq;

fn show_validation(effects: &[ViewEffect]) -> Option<&str> {
    effects.iter().find_map(|effect| match effect {
        ViewEffect::ShowValidation(message) => Some(message.as_str()),
        _ => None,
    })
}

#[test]
fn missing_dataset_is_reported_first() {
    let mut state = state();
    bootstrap(&mut state, None, None);

    let effects = user(&mut state, UserAction::Visualize);

    assert_eq!(
        show_validation(&effects),
        Some(ValidationError::MissingDataset.message())
    );
    assert_eq!(state.chart, ChartStatus::NotRun);
}

#[test]
fn missing_only_locations_names_locations() {
    let (mut state, _) = mounted(MIGRATION);
    user(&mut state, UserAction::SetSubaction(Subaction::Raw));

    let effects = user(&mut state, UserAction::Visualize);

    let message = show_validation(&effects).expect("validation message");
    assert_eq!(message, ValidationError::MissingLocations.message());
    assert!(!message.contains("dataset"));
    assert!(!message.contains("period"));
    assert_eq!(state.validation_message.as_deref(), Some(message));
    assert_eq!(state.active, None);
    assert_eq!(state.chart, ChartStatus::NotRun);
}

#[test]
fn subaction_is_checked_before_locations() {
    let (mut state, _) = mounted(MIGRATION);

    let effects = user(&mut state, UserAction::Visualize);

    assert_eq!(
        show_validation(&effects),
        Some(ValidationError::MissingSubaction.message())
    );
}

#[test]
fn dismiss_clears_validation_message() {
    let (mut state, _) = mounted(MIGRATION);
    user(&mut state, UserAction::Visualize);

    assert_eq!(
        user(&mut state, UserAction::DismissValidation),
        vec![ViewEffect::RequestRender]
    );
    assert_eq!(state.validation_message, None);
    assert!(user(&mut state, UserAction::DismissValidation).is_empty());
}

#[test]
fn visualize_with_loaded_dataset_builds_chart() {
    let (mut state, effects) = mounted(MIGRATION);
    load(&mut state, fetch_ticket(&effects).expect("fetch"));
    user(&mut state, UserAction::SetLocations(vec![location("a"), location("b")]));
    user(&mut state, UserAction::SetSubaction(Subaction::Raw));

    let effects = user(&mut state, UserAction::Visualize);

    assert_eq!(effects, vec![ViewEffect::RequestRender]);
    assert!(!state.is_dirty);
    let Some(ChartData::Flow(flow)) = state.chart.data() else {
        panic!("expected flow matrix, got {:?}", state.chart);
    };
    assert_eq!(flow.names, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    assert_eq!(flow.matrix[0], vec![2.0, 10.0, 0.0]);
    assert_eq!(
        state.active.as_ref().map(|request| request.visualization),
        Some(VisualizationType::Chord)
    );
}

#[test]
fn visualize_before_data_arrives_shows_loading() {
    let (mut state, effects) = mounted(MIGRATION);
    let ticket = fetch_ticket(&effects).expect("fetch");
    user(&mut state, UserAction::SetLocations(vec![location("a")]));
    user(&mut state, UserAction::SetSubaction(Subaction::Raw));

    user(&mut state, UserAction::Visualize);
    assert_eq!(state.chart, ChartStatus::Loading);

    load(&mut state, ticket);
    assert!(matches!(state.chart, ChartStatus::Ready(ChartData::Flow(_))));
}

#[test]
fn filters_matching_nothing_yield_empty_not_error() {
    let (mut state, effects) = mounted(MIGRATION);
    load(&mut state, fetch_ticket(&effects).expect("fetch"));
    user(&mut state, UserAction::SetLocations(vec![location("zz")]));
    user(&mut state, UserAction::SetSubaction(Subaction::Raw));

    user(&mut state, UserAction::Visualize);

    assert!(state.chart.is_empty());
    assert_eq!(state.chart.error(), None);
}
