use crate::ids::StudentId;
use crate::model::Phase;

/// Error taxonomy for a single attendance session. All variants are local
/// and recoverable — the surrounding page disables a control or logs, it
/// never crashes.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("invalid transition: cannot {action} while {from}")]
    InvalidTransition { from: Phase, action: &'static str },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("unknown student: {0}")]
    UnknownStudent(StudentId),

    #[error("student already marked present: {0}")]
    AlreadyMarked(StudentId),

    #[error("session already completed")]
    SessionCompleted,

    #[error("session clock already running")]
    ClockAlreadyRunning,

    #[error("session clock not running")]
    ClockNotRunning,
}

impl SessionError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::NothingToUndo => "nothing_to_undo",
            Self::UnknownStudent(_) => "unknown_student",
            Self::AlreadyMarked(_) => "already_marked",
            Self::SessionCompleted => "session_completed",
            Self::ClockAlreadyRunning => "clock_already_running",
            Self::ClockNotRunning => "clock_not_running",
        }
    }
}
