use rollcall_core::errors::SessionError;
use rollcall_core::ids::ClassId;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("class not found: {0}")]
    ClassNotFound(ClassId),

    #[error("class is not ongoing: {0}")]
    ClassNotOngoing(ClassId),

    #[error("class already has an open attendance session: {0}")]
    SessionAlreadyOpen(ClassId),

    #[error("no active attendance session for class: {0}")]
    NoActiveSession(ClassId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::model::Phase;

    #[test]
    fn session_error_converts() {
        let err: EngineError = SessionError::InvalidTransition {
            from: Phase::Idle,
            action: "pause",
        }
        .into();
        assert!(matches!(err, EngineError::Session(_)));
        assert!(err.to_string().contains("cannot pause while idle"));
    }

    #[test]
    fn coordinator_errors_name_the_class() {
        let id = ClassId::from_raw("class_demo");
        assert!(EngineError::ClassNotFound(id.clone()).to_string().contains("class_demo"));
        assert!(EngineError::SessionAlreadyOpen(id).to_string().contains("class_demo"));
    }
}
