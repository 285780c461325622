use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::info;

use rollcall_core::config::PolicyConfig;
use rollcall_core::events::SessionEvent;
use rollcall_core::ids::ClassId;
use rollcall_core::model::{ClassSession, ClassStatus, Student};

use crate::error::EngineError;
use crate::session::AttendanceSession;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// The registry the surrounding pages work against: the loaded class
/// list with its derived present counts, and at most one active
/// attendance session per class. Sessions are fully independent of each
/// other; the class list is the only shared state, and each session
/// writes back to its own class entry only.
pub struct SessionCoordinator {
    classes: Arc<DashMap<ClassId, ClassSession>>,
    enrollments: DashMap<ClassId, Vec<Student>>,
    active: DashMap<ClassId, Arc<AttendanceSession>>,
    policy_config: PolicyConfig,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionCoordinator {
    pub fn new(policy_config: PolicyConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            classes: Arc::new(DashMap::new()),
            enrollments: DashMap::new(),
            active: DashMap::new(),
            policy_config,
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Register a class and its enrollment. The class's student total is
    /// kept in sync with the roster it will generate.
    pub fn load_class(&self, mut class: ClassSession, roster: Vec<Student>) -> ClassId {
        class.total_students = roster.len() as u32;
        let id = class.id.clone();
        self.enrollments.insert(id.clone(), roster);
        self.classes.insert(id.clone(), class);
        id
    }

    /// The class-cards listing, in schedule order, with live derived
    /// present counts.
    pub fn classes(&self) -> Vec<ClassSession> {
        let mut list: Vec<ClassSession> = self.classes.iter().map(|e| e.value().clone()).collect();
        list.sort_by_key(|c| c.starts_at);
        list
    }

    pub fn class(&self, id: &ClassId) -> Option<ClassSession> {
        self.classes.get(id).map(|e| e.value().clone())
    }

    /// Open an attendance session for an ongoing class. Generates a
    /// fresh all-absent roster from the enrollment.
    pub fn open(
        &self,
        class_id: &ClassId,
        auto_mark: bool,
    ) -> Result<Arc<AttendanceSession>, EngineError> {
        let class = self
            .class(class_id)
            .ok_or_else(|| EngineError::ClassNotFound(class_id.clone()))?;
        if class.status != ClassStatus::Ongoing {
            return Err(EngineError::ClassNotOngoing(class_id.clone()));
        }
        if self.active.contains_key(class_id) {
            return Err(EngineError::SessionAlreadyOpen(class_id.clone()));
        }

        let roster = self
            .enrollments
            .get(class_id)
            .map(|e| e.value().clone())
            .unwrap_or_default();
        let session = Arc::new(AttendanceSession::new(
            &class,
            roster,
            auto_mark,
            self.policy_config.clone(),
            Arc::clone(&self.classes),
            self.event_tx.clone(),
        ));
        info!(
            class_id = %class_id,
            session_id = %session.id(),
            auto_mark,
            "attendance session opened"
        );
        self.active.insert(class_id.clone(), Arc::clone(&session));
        Ok(session)
    }

    /// Handle to the class's active session.
    pub fn session(&self, class_id: &ClassId) -> Result<Arc<AttendanceSession>, EngineError> {
        self.active
            .get(class_id)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| EngineError::NoActiveSession(class_id.clone()))
    }

    /// Navigation-away teardown for one class: discard the session,
    /// cancelling its clock and any pending auto-mark timers.
    pub fn close(&self, class_id: &ClassId) -> Result<(), EngineError> {
        let (_, session) = self
            .active
            .remove(class_id)
            .ok_or_else(|| EngineError::NoActiveSession(class_id.clone()))?;
        session.shutdown();
        info!(class_id = %class_id, "attendance session closed");
        Ok(())
    }

    /// Tear down every active session. Returns how many were discarded.
    pub fn shutdown_all(&self) -> usize {
        let keys: Vec<ClassId> = self.active.iter().map(|e| e.key().clone()).collect();
        let mut count = 0;
        for key in keys {
            if let Some((_, session)) = self.active.remove(&key) {
                session.shutdown();
                count += 1;
            }
        }
        count
    }
}
