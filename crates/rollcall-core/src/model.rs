use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{ClassId, StudentId};

/// Lifecycle phase of an attendance session.
/// `Idle → Active ⇄ Paused`, and `Active | Paused → Completed` (terminal).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Active,
    Paused,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Who produced a presence mark: the lecturer's manual tap, or the
/// simulated digital check-in policy. Both flow through the same roster
/// operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkSource {
    Manual,
    Auto,
}

/// One enrolled student in a session roster. Created when the roster is
/// generated, mutated only through the session's mark/unmark operations,
/// discarded with the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub roll_no: String,
    pub present: bool,
}

impl Student {
    pub fn new(name: impl Into<String>, roll_no: impl Into<String>) -> Self {
        Self {
            id: StudentId::new(),
            name: name.into(),
            roll_no: roll_no.into(),
            present: false,
        }
    }
}

/// Scheduling status of a class, computed from wall-clock time versus the
/// scheduled window when the class list is loaded. Not advanced
/// automatically while a session is open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl ClassStatus {
    pub fn at(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now < starts_at {
            Self::Upcoming
        } else if now < ends_at {
            Self::Ongoing
        } else {
            Self::Completed
        }
    }
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Upcoming => "upcoming",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// A scheduled class period. `present_count` is derived state: it must
/// always equal the number of present students in the session roster, and
/// only the owning attendance session writes it back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSession {
    pub id: ClassId,
    pub subject: String,
    pub section: String,
    pub room: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub total_students: u32,
    pub present_count: u32,
    pub status: ClassStatus,
}

impl ClassSession {
    /// Build a class entry, computing `status` from `now` at load time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        subject: impl Into<String>,
        section: impl Into<String>,
        room: impl Into<String>,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        total_students: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ClassId::new(),
            subject: subject.into(),
            section: section.into(),
            room: room.into(),
            starts_at,
            ends_at,
            total_students,
            present_count: 0,
            status: ClassStatus::at(starts_at, ends_at, now),
        }
    }
}
