use std::sync::Once;

use exporter_core::{update, AppState, Effect, Msg, SessionState};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[test]
fn run_request_from_idle_starts_run() {
    init_logging();
    let state = AppState::new();

    let (state, effects) = update(state, Msg::RunRequested);

    assert_eq!(state.session(), SessionState::Running);
    assert_eq!(effects, vec![Effect::StartRun]);
}

#[test]
fn second_run_request_is_rejected_not_queued() {
    init_logging();
    let state = AppState::new();
    let (state, _) = update(state, Msg::RunRequested);

    let (state, effects) = update(state, Msg::RunRequested);

    assert_eq!(state.session(), SessionState::Running);
    assert_eq!(effects, vec![Effect::RejectAlreadyRunning]);
}

#[test]
fn run_completion_returns_to_idle_and_counts() {
    init_logging();
    let state = AppState::new();
    let (state, _) = update(state, Msg::RunRequested);

    let (state, effects) = update(state, Msg::RunCompleted);

    assert_eq!(state.session(), SessionState::Idle);
    assert_eq!(state.runs_completed(), 1);
    assert!(effects.is_empty());
}

#[test]
fn completion_while_idle_is_a_no_op() {
    init_logging();
    let state = AppState::new();

    let (state, effects) = update(state, Msg::RunCompleted);

    assert_eq!(state.session(), SessionState::Idle);
    assert_eq!(state.runs_completed(), 0);
    assert!(effects.is_empty());
}

#[test]
fn run_can_be_restarted_after_completion() {
    init_logging();
    let state = AppState::new();
    let (state, _) = update(state, Msg::RunRequested);
    let (state, _) = update(state, Msg::RunCompleted);

    let (state, effects) = update(state, Msg::RunRequested);

    assert_eq!(state.session(), SessionState::Running);
    assert_eq!(effects, vec![Effect::StartRun]);
}
