use serde::{Deserialize, Serialize};

use crate::ids::{ClassId, SessionId, StudentId};
use crate::model::MarkSource;

/// Session lifecycle events emitted while attendance is being taken.
/// These are the engine → UI surface: the timer display, the markable
/// list, and the class-cards grid are all driven from this stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    #[serde(rename = "session_started")]
    SessionStarted {
        session_id: SessionId,
        class_id: ClassId,
        roster_size: u32,
    },

    #[serde(rename = "tick")]
    Tick {
        session_id: SessionId,
        elapsed_seconds: u64,
    },

    #[serde(rename = "session_paused")]
    SessionPaused {
        session_id: SessionId,
        elapsed_seconds: u64,
    },

    #[serde(rename = "session_resumed")]
    SessionResumed {
        session_id: SessionId,
        elapsed_seconds: u64,
    },

    #[serde(rename = "student_marked")]
    StudentMarked {
        session_id: SessionId,
        student_id: StudentId,
        source: MarkSource,
        present_count: u32,
    },

    #[serde(rename = "mark_undone")]
    MarkUndone {
        session_id: SessionId,
        student_id: StudentId,
        present_count: u32,
    },

    #[serde(rename = "session_completed")]
    SessionCompleted {
        session_id: SessionId,
        present_count: u32,
        total_students: u32,
        absentees: Vec<StudentId>,
    },
}

impl SessionEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::SessionStarted { session_id, .. }
            | Self::Tick { session_id, .. }
            | Self::SessionPaused { session_id, .. }
            | Self::SessionResumed { session_id, .. }
            | Self::StudentMarked { session_id, .. }
            | Self::MarkUndone { session_id, .. }
            | Self::SessionCompleted { session_id, .. } => session_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session_started",
            Self::Tick { .. } => "tick",
            Self::SessionPaused { .. } => "session_paused",
            Self::SessionResumed { .. } => "session_resumed",
            Self::StudentMarked { .. } => "student_marked",
            Self::MarkUndone { .. } => "mark_undone",
            Self::SessionCompleted { .. } => "session_completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_session_id() {
        let sid = SessionId::new();
        let evt = SessionEvent::Tick {
            session_id: sid.clone(),
            elapsed_seconds: 42,
        };
        assert_eq!(evt.session_id(), &sid);
    }

    #[test]
    fn event_type_str() {
        let evt = SessionEvent::SessionCompleted {
            session_id: SessionId::new(),
            present_count: 18,
            total_students: 30,
            absentees: vec![StudentId::new()],
        };
        assert_eq!(evt.event_type(), "session_completed");
    }

    #[test]
    fn serde_tag_matches_event_type() {
        let evt = SessionEvent::StudentMarked {
            session_id: SessionId::new(),
            student_id: StudentId::new(),
            source: MarkSource::Auto,
            present_count: 3,
        };
        let json = serde_json::to_value(&evt).unwrap();
        assert_eq!(json["type"], "student_marked");
        assert_eq!(json["source"], "auto");
    }

    #[test]
    fn serde_roundtrip() {
        let events = vec![
            SessionEvent::SessionStarted {
                session_id: SessionId::new(),
                class_id: ClassId::new(),
                roster_size: 30,
            },
            SessionEvent::SessionPaused {
                session_id: SessionId::new(),
                elapsed_seconds: 95,
            },
            SessionEvent::SessionCompleted {
                session_id: SessionId::new(),
                present_count: 2,
                total_students: 3,
                absentees: vec![StudentId::new()],
            },
        ];

        for evt in &events {
            let json = serde_json::to_string(evt).unwrap();
            let parsed: SessionEvent = serde_json::from_str(&json).unwrap();
            let json2 = serde_json::to_string(&parsed).unwrap();
            assert_eq!(json, json2);
        }
    }
}
