use std::fmt;

/// Severity of one log event as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Normal progress output.
    Info,
    /// Something was skipped or degraded; the run continues.
    Warn,
    /// A component failed; other components may still complete.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warn => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// One entry of the ordered log stream a run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Human-readable message.
    pub message: String,
    /// Display severity.
    pub severity: Severity,
}

impl LogEvent {
    /// Builds an [`Severity::Info`] event.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
        }
    }

    /// Builds a [`Severity::Warn`] event.
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Warn,
        }
    }

    /// Builds an [`Severity::Error`] event.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }
}
