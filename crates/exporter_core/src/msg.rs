/// Inputs to the pure session update function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Caller asked to start an export run.
    RunRequested,
    /// The active run finished (successfully or not).
    RunCompleted,
}
