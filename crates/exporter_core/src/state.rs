/// Lifecycle of one caller session. At most one export run may be active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No run active; a run may be started.
    #[default]
    Idle,
    /// A run is active; further run requests are rejected, not queued.
    Running,
}

/// Pure session state owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    session: SessionState,
    runs_completed: u64,
}

impl AppState {
    /// Fresh idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session phase.
    pub fn session(&self) -> SessionState {
        self.session
    }

    /// Number of runs finished since the session started.
    pub fn runs_completed(&self) -> u64 {
        self.runs_completed
    }

    pub(crate) fn start_run(&mut self) {
        self.session = SessionState::Running;
    }

    pub(crate) fn finish_run(&mut self) {
        self.session = SessionState::Idle;
        self.runs_completed += 1;
    }
}
