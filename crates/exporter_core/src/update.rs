use crate::{AppState, Effect, Msg, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RunRequested => match state.session() {
            SessionState::Idle => {
                state.start_run();
                vec![Effect::StartRun]
            }
            SessionState::Running => vec![Effect::RejectAlreadyRunning],
        },
        Msg::RunCompleted => {
            if state.session() == SessionState::Running {
                state.finish_run();
            }
            Vec::new()
        }
    };

    (state, effects)
}
