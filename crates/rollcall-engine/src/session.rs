use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use rollcall_core::config::PolicyConfig;
use rollcall_core::errors::SessionError;
use rollcall_core::events::SessionEvent;
use rollcall_core::ids::{ClassId, SessionId, StudentId};
use rollcall_core::model::{ClassSession, MarkSource, Phase, Student};

use crate::clock::SessionClock;
use crate::policy::{AutoMarkPolicy, Trigger};
use crate::roster::Roster;

/// Final tally surfaced by `stop()`, kept queryable afterwards so the
/// page can offer the "mark present after the fact" follow-up.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub session_id: SessionId,
    pub class_id: ClassId,
    pub present_count: u32,
    pub total_students: u32,
    pub absentees: Vec<Student>,
    pub duration_seconds: u64,
}

/// Roster and phase behind one lock: every mark — manual or automatic —
/// is a single indivisible operation with respect to this mutex, and the
/// class's derived present count is written back under the same guard.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) phase: Phase,
    pub(crate) roster: Roster,
    pub(crate) class_id: ClassId,
    pub(crate) classes: Arc<DashMap<ClassId, ClassSession>>,
    pub(crate) completion: Option<CompletionSummary>,
}

impl SessionState {
    pub(crate) fn apply_mark(&mut self, id: &StudentId, source: MarkSource) -> Result<u32, SessionError> {
        let count = self.roster.mark_present(id, source)?;
        self.write_back(count);
        Ok(count)
    }

    pub(crate) fn apply_undo(&mut self) -> Result<(StudentId, u32), SessionError> {
        let id = self.roster.undo_last()?;
        let count = self.roster.present_count();
        self.write_back(count);
        Ok((id, count))
    }

    fn write_back(&self, count: u32) {
        if let Some(mut class) = self.classes.get_mut(&self.class_id) {
            class.present_count = count;
        }
    }
}

/// The attendance-taking state machine for one class session.
///
/// `Idle → Active ⇄ Paused`, and `Active | Paused → Completed`
/// (terminal). Single-use: a new class session gets a new instance. The
/// clock and the auto-mark policy own every timer involved, and every
/// phase transition cancels the timers it invalidates, so nothing can
/// fire after a pause or stop.
#[derive(Debug)]
pub struct AttendanceSession {
    id: SessionId,
    class_id: ClassId,
    auto_mark_enabled: bool,
    state: Arc<Mutex<SessionState>>,
    clock: Mutex<SessionClock>,
    policy: Mutex<AutoMarkPolicy>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl AttendanceSession {
    pub fn new(
        class: &ClassSession,
        roster: Vec<Student>,
        auto_mark_enabled: bool,
        policy_config: PolicyConfig,
        classes: Arc<DashMap<ClassId, ClassSession>>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let id = SessionId::new();
        let state = SessionState {
            phase: Phase::Idle,
            roster: Roster::new(roster),
            class_id: class.id.clone(),
            classes,
            completion: None,
        };
        // A fresh roster means a fresh derived count.
        state.write_back(0);

        Self {
            id: id.clone(),
            class_id: class.id.clone(),
            auto_mark_enabled,
            state: Arc::new(Mutex::new(state)),
            clock: Mutex::new(SessionClock::new(id, event_tx.clone())),
            policy: Mutex::new(AutoMarkPolicy::new(policy_config)),
            event_tx,
        }
    }

    /// Idle → Active: start the clock and, if enabled, the auto-mark
    /// "on start" run. The phase commits only after the clock transition
    /// succeeds, so a failure leaves the phase untouched.
    pub fn start(&self) -> Result<(), SessionError> {
        {
            let mut st = self.state.lock();
            if st.phase != Phase::Idle {
                return Err(SessionError::InvalidTransition {
                    from: st.phase,
                    action: "start",
                });
            }
            self.clock.lock().start()?;
            st.phase = Phase::Active;
        }
        if self.auto_mark_enabled {
            self.policy.lock().trigger(
                Trigger::Start,
                self.id.clone(),
                Arc::clone(&self.state),
                self.event_tx.clone(),
            );
        }
        let roster_size = self.state.lock().roster.total();
        self.send_event(SessionEvent::SessionStarted {
            session_id: self.id.clone(),
            class_id: self.class_id.clone(),
            roster_size,
        });
        Ok(())
    }

    /// Active → Paused: freeze the clock and cancel pending auto-marks.
    /// The phase commits only after the clock transition succeeds.
    pub fn pause(&self) -> Result<(), SessionError> {
        {
            let mut st = self.state.lock();
            if st.phase != Phase::Active {
                return Err(SessionError::InvalidTransition {
                    from: st.phase,
                    action: "pause",
                });
            }
            self.clock.lock().pause()?;
            st.phase = Phase::Paused;
        }
        self.policy.lock().cancel_pending();
        self.send_event(SessionEvent::SessionPaused {
            session_id: self.id.clone(),
            elapsed_seconds: self.elapsed_seconds(),
        });
        Ok(())
    }

    /// Paused → Active: the clock continues from its preserved elapsed
    /// value and, if enabled, the auto-mark "on resume" run fires against
    /// the then-current remaining roster.
    pub fn resume(&self) -> Result<(), SessionError> {
        {
            let mut st = self.state.lock();
            if st.phase != Phase::Paused {
                return Err(SessionError::InvalidTransition {
                    from: st.phase,
                    action: "resume",
                });
            }
            self.clock.lock().resume()?;
            st.phase = Phase::Active;
        }
        if self.auto_mark_enabled {
            self.policy.lock().trigger(
                Trigger::Resume,
                self.id.clone(),
                Arc::clone(&self.state),
                self.event_tx.clone(),
            );
        }
        self.send_event(SessionEvent::SessionResumed {
            session_id: self.id.clone(),
            elapsed_seconds: self.elapsed_seconds(),
        });
        Ok(())
    }

    /// Active | Paused → Completed: snapshot the final tally and the
    /// absentee list, cancel every timer, reset the clock. The session
    /// never completes on its own — even a fully marked roster waits for
    /// this call.
    pub fn stop(&self) -> Result<CompletionSummary, SessionError> {
        let summary = {
            let mut st = self.state.lock();
            match st.phase {
                Phase::Active | Phase::Paused => {}
                Phase::Completed => return Err(SessionError::SessionCompleted),
                Phase::Idle => {
                    return Err(SessionError::InvalidTransition {
                        from: st.phase,
                        action: "stop",
                    })
                }
            }
            st.phase = Phase::Completed;
            let present_count = st.roster.present_count();
            st.write_back(present_count);
            let summary = CompletionSummary {
                session_id: self.id.clone(),
                class_id: st.class_id.clone(),
                present_count,
                total_students: st.roster.total(),
                absentees: st.roster.absentees(),
                duration_seconds: self.clock.lock().elapsed_seconds(),
            };
            st.completion = Some(summary.clone());
            summary
        };
        self.policy.lock().cancel_pending();
        self.clock.lock().stop();
        self.send_event(SessionEvent::SessionCompleted {
            session_id: self.id.clone(),
            present_count: summary.present_count,
            total_students: summary.total_students,
            absentees: summary.absentees.iter().map(|s| s.id.clone()).collect(),
        });
        Ok(summary)
    }

    /// Mark a student present by hand. Allowed in any non-terminal phase;
    /// shares the roster code path with the auto-mark policy.
    pub fn mark_manually(&self, student_id: &StudentId) -> Result<u32, SessionError> {
        let present_count = {
            let mut st = self.state.lock();
            if st.phase == Phase::Completed {
                return Err(SessionError::SessionCompleted);
            }
            st.apply_mark(student_id, MarkSource::Manual)?
        };
        self.send_event(SessionEvent::StudentMarked {
            session_id: self.id.clone(),
            student_id: student_id.clone(),
            source: MarkSource::Manual,
            present_count,
        });
        Ok(present_count)
    }

    /// Revert the most recent mark (manual or automatic).
    pub fn undo_last(&self) -> Result<StudentId, SessionError> {
        let (student_id, present_count) = {
            let mut st = self.state.lock();
            if st.phase == Phase::Completed {
                return Err(SessionError::SessionCompleted);
            }
            st.apply_undo()?
        };
        self.send_event(SessionEvent::MarkUndone {
            session_id: self.id.clone(),
            student_id: student_id.clone(),
            present_count,
        });
        Ok(student_id)
    }

    /// Navigation-away teardown: cancel the ticker and any pending
    /// auto-mark timers without completing the session.
    pub fn shutdown(&self) {
        self.policy.lock().cancel_pending();
        let mut clock = self.clock.lock();
        if clock.is_running() {
            let _ = clock.pause();
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn class_id(&self) -> &ClassId {
        &self.class_id
    }

    pub fn auto_mark_enabled(&self) -> bool {
        self.auto_mark_enabled
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.clock.lock().elapsed_seconds()
    }

    /// "mm:ss" for the timer display.
    pub fn format_elapsed(&self) -> String {
        self.clock.lock().format_elapsed()
    }

    pub fn present_count(&self) -> u32 {
        self.state.lock().roster.present_count()
    }

    pub fn remaining_count(&self) -> u32 {
        self.state.lock().roster.remaining_count()
    }

    pub fn total_students(&self) -> u32 {
        self.state.lock().roster.total()
    }

    pub fn auto_marked_count(&self) -> u32 {
        self.state.lock().roster.auto_marked_count()
    }

    /// The markable list: still-absent students in presentation order.
    pub fn remaining(&self) -> Vec<Student> {
        self.state.lock().roster.remaining()
    }

    /// The "recently marked" list, most recent first.
    pub fn marked(&self) -> Vec<Student> {
        self.state.lock().roster.marked()
    }

    pub fn completion(&self) -> Option<CompletionSummary> {
        self.state.lock().completion.clone()
    }

    fn send_event(&self, event: SessionEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("no event receivers — session event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TICK_INTERVAL;
    use chrono::Utc;
    use std::time::Duration;

    fn fixture(
        n: usize,
        auto_mark: bool,
    ) -> (
        AttendanceSession,
        Vec<StudentId>,
        broadcast::Receiver<SessionEvent>,
        Arc<DashMap<ClassId, ClassSession>>,
    ) {
        let now = Utc::now();
        let class = ClassSession::new(
            "Data Structures",
            "CS-3A",
            "LH-204",
            now - chrono::Duration::minutes(10),
            now + chrono::Duration::minutes(40),
            n as u32,
            now,
        );
        let students: Vec<Student> = (0..n)
            .map(|i| Student::new(format!("Student {i}"), format!("CS-2024-{i:03}")))
            .collect();
        let ids: Vec<StudentId> = students.iter().map(|s| s.id.clone()).collect();
        let classes = Arc::new(DashMap::new());
        classes.insert(class.id.clone(), class.clone());
        let (tx, rx) = broadcast::channel(1024);
        let session = AttendanceSession::new(
            &class,
            students,
            auto_mark,
            PolicyConfig::default(),
            Arc::clone(&classes),
            tx,
        );
        (session, ids, rx, classes)
    }

    async fn advance_by(d: Duration) {
        tokio::task::yield_now().await;
        tokio::time::advance(d).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
    }

    async fn ticks(n: u64) {
        for _ in 0..n {
            advance_by(TICK_INTERVAL).await;
        }
    }

    fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    // -- manual flow --

    #[tokio::test(start_paused = true)]
    async fn manual_flow_scenario() {
        let (session, ids, _rx, _classes) = fixture(3, false);

        session.start().unwrap();
        assert_eq!(session.phase(), Phase::Active);

        session.mark_manually(&ids[0]).unwrap();
        assert_eq!(session.present_count(), 1);
        let remaining: Vec<StudentId> = session.remaining().iter().map(|s| s.id.clone()).collect();
        assert_eq!(remaining, vec![ids[1].clone(), ids[2].clone()]);

        let undone = session.undo_last().unwrap();
        assert_eq!(undone, ids[0]);
        assert_eq!(session.present_count(), 0);
        assert!(session.remaining().iter().any(|s| s.id == ids[0]));

        session.mark_manually(&ids[0]).unwrap();
        session.mark_manually(&ids[1]).unwrap();
        assert_eq!(session.present_count(), 2);

        let summary = session.stop().unwrap();
        assert_eq!(session.phase(), Phase::Completed);
        assert_eq!(summary.present_count, 2);
        let absent: Vec<StudentId> = summary.absentees.iter().map(|s| s.id.clone()).collect();
        assert_eq!(absent, vec![ids[2].clone()]);
    }

    #[tokio::test(start_paused = true)]
    async fn counts_invariant_holds() {
        let (session, ids, _rx, _classes) = fixture(4, false);
        session.start().unwrap();
        session.mark_manually(&ids[2]).unwrap();
        session.mark_manually(&ids[0]).unwrap();
        assert_eq!(
            session.present_count(),
            session.total_students() - session.remaining_count()
        );
        session.undo_last().unwrap();
        assert_eq!(
            session.present_count(),
            session.total_students() - session.remaining_count()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn undo_with_no_marks_reports_error() {
        let (session, _ids, _rx, _classes) = fixture(2, false);
        session.start().unwrap();
        assert_eq!(session.undo_last().unwrap_err(), SessionError::NothingToUndo);
        assert_eq!(session.present_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn marking_allowed_while_idle_and_paused() {
        let (session, ids, _rx, _classes) = fixture(3, false);
        session.mark_manually(&ids[0]).unwrap();
        assert_eq!(session.present_count(), 1);

        session.start().unwrap();
        session.pause().unwrap();
        session.mark_manually(&ids[1]).unwrap();
        assert_eq!(session.present_count(), 2);
    }

    // -- transitions --

    #[tokio::test(start_paused = true)]
    async fn pause_from_idle_rejected_and_phase_unchanged() {
        let (session, _ids, _rx, _classes) = fixture(3, false);
        let err = session.pause().unwrap_err();
        assert_eq!(err.error_kind(), "invalid_transition");
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_rejected() {
        let (session, _ids, _rx, _classes) = fixture(3, false);
        session.start().unwrap();
        assert!(matches!(
            session.start().unwrap_err(),
            SessionError::InvalidTransition { from: Phase::Active, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn resume_from_active_rejected() {
        let (session, _ids, _rx, _classes) = fixture(3, false);
        session.start().unwrap();
        assert!(matches!(
            session.resume().unwrap_err(),
            SessionError::InvalidTransition { from: Phase::Active, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_from_idle_rejected() {
        let (session, _ids, _rx, _classes) = fixture(3, false);
        assert!(matches!(
            session.stop().unwrap_err(),
            SessionError::InvalidTransition { from: Phase::Idle, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_from_paused_allowed() {
        let (session, _ids, _rx, _classes) = fixture(3, false);
        session.start().unwrap();
        session.pause().unwrap();
        let summary = session.stop().unwrap();
        assert_eq!(summary.present_count, 0);
        assert_eq!(summary.absentees.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_phase_is_immutable() {
        let (session, ids, _rx, _classes) = fixture(3, false);
        session.start().unwrap();
        session.mark_manually(&ids[0]).unwrap();
        session.stop().unwrap();

        assert!(session.start().is_err());
        assert!(session.pause().is_err());
        assert!(session.resume().is_err());
        assert_eq!(session.stop().unwrap_err(), SessionError::SessionCompleted);
        assert_eq!(
            session.mark_manually(&ids[1]).unwrap_err(),
            SessionError::SessionCompleted
        );
        assert_eq!(session.undo_last().unwrap_err(), SessionError::SessionCompleted);

        assert_eq!(session.phase(), Phase::Completed);
        assert_eq!(session.present_count(), 1);
        assert_eq!(session.elapsed_seconds(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fully_marked_roster_does_not_auto_complete() {
        let (session, ids, _rx, _classes) = fixture(2, false);
        session.start().unwrap();
        session.mark_manually(&ids[0]).unwrap();
        session.mark_manually(&ids[1]).unwrap();
        assert_eq!(session.remaining_count(), 0);
        assert_eq!(session.phase(), Phase::Active);

        let summary = session.stop().unwrap();
        assert_eq!(session.phase(), Phase::Completed);
        assert!(summary.absentees.is_empty());
    }

    // -- timer --

    #[tokio::test(start_paused = true)]
    async fn pause_resume_timer_scenario() {
        let (session, _ids, _rx, _classes) = fixture(3, false);
        session.start().unwrap();
        ticks(5).await;
        assert_eq!(session.elapsed_seconds(), 5);

        session.pause().unwrap();
        ticks(10).await;
        assert_eq!(session.elapsed_seconds(), 5);

        session.resume().unwrap();
        ticks(2).await;
        assert_eq!(session.elapsed_seconds(), 7);
        assert_eq!(session.format_elapsed(), "00:07");
    }

    #[tokio::test(start_paused = true)]
    async fn stop_resets_elapsed_and_it_stays_frozen() {
        let (session, _ids, _rx, _classes) = fixture(3, false);
        session.start().unwrap();
        ticks(4).await;
        let summary = session.stop().unwrap();
        assert_eq!(summary.duration_seconds, 4);
        assert_eq!(session.elapsed_seconds(), 0);
        ticks(5).await;
        assert_eq!(session.elapsed_seconds(), 0);
    }

    // -- auto-mark --

    #[tokio::test(start_paused = true)]
    async fn start_auto_marks_twenty_percent_staggered() {
        let (session, _ids, _rx, _classes) = fixture(10, true);
        session.start().unwrap();
        assert_eq!(session.present_count(), 0);

        advance_by(Duration::from_millis(800)).await;
        assert_eq!(session.present_count(), 1);
        advance_by(Duration::from_millis(800)).await;
        assert_eq!(session.present_count(), 2);
        assert_eq!(session.auto_marked_count(), 2);

        // Quota exhausted — no further auto-marks until a resume.
        ticks(5).await;
        assert_eq!(session.present_count(), 2);
        assert_eq!(session.auto_marked_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_marks_take_remaining_in_presentation_order() {
        let (session, ids, _rx, _classes) = fixture(10, true);
        session.start().unwrap();
        advance_by(Duration::from_millis(800)).await;
        advance_by(Duration::from_millis(800)).await;

        let marked: Vec<StudentId> = session.marked().iter().map(|s| s.id.clone()).collect();
        // Most recent first.
        assert_eq!(marked, vec![ids[1].clone(), ids[0].clone()]);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_cancels_pending_auto_marks() {
        let (session, _ids, _rx, _classes) = fixture(10, true);
        session.start().unwrap();
        advance_by(Duration::from_millis(800)).await;
        assert_eq!(session.present_count(), 1);

        session.pause().unwrap();
        ticks(10).await;
        assert_eq!(session.present_count(), 1);
        assert_eq!(session.auto_marked_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn resume_auto_marks_ten_percent_of_then_remaining() {
        let (session, _ids, _rx, _classes) = fixture(10, true);
        session.start().unwrap();
        advance_by(Duration::from_millis(800)).await;
        advance_by(Duration::from_millis(800)).await;
        assert_eq!(session.present_count(), 2);

        session.pause().unwrap();
        session.resume().unwrap();
        // R' = 8, ceil(8 * 0.10) = 1, staggered at 1000ms.
        advance_by(Duration::from_millis(1000)).await;
        assert_eq!(session.present_count(), 3);
        assert_eq!(session.auto_marked_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_auto_marks() {
        let (session, _ids, _rx, _classes) = fixture(10, true);
        session.start().unwrap();
        let summary = session.stop().unwrap();
        assert_eq!(summary.present_count, 0);

        ticks(10).await;
        assert_eq!(session.present_count(), 0);
        assert_eq!(session.phase(), Phase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_mark_skips_student_marked_manually_during_stagger() {
        // R = 5 → quota 1, targeting the first remaining student.
        let (session, ids, _rx, _classes) = fixture(5, true);
        session.start().unwrap();
        session.mark_manually(&ids[0]).unwrap();

        advance_by(Duration::from_millis(800)).await;
        // The policy's target was already present; it skips rather than
        // double-marking or erroring.
        assert_eq!(session.present_count(), 1);
        assert_eq!(session.auto_marked_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_mark_noop_on_empty_roster() {
        let (session, _ids, _rx, _classes) = fixture(0, true);
        session.start().unwrap();
        ticks(3).await;
        assert_eq!(session.present_count(), 0);
        assert_eq!(session.phase(), Phase::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_mark_disabled_means_no_policy_marks() {
        let (session, _ids, _rx, _classes) = fixture(10, false);
        session.start().unwrap();
        ticks(5).await;
        assert_eq!(session.present_count(), 0);
        assert_eq!(session.auto_marked_count(), 0);
    }

    // -- events & write-back --

    #[tokio::test(start_paused = true)]
    async fn lifecycle_emits_events_in_order() {
        let (session, ids, mut rx, _classes) = fixture(3, false);
        session.start().unwrap();
        ticks(2).await;
        session.mark_manually(&ids[0]).unwrap();
        session.pause().unwrap();
        session.resume().unwrap();
        session.undo_last().unwrap();
        session.stop().unwrap();

        let types: Vec<&'static str> = drain(&mut rx).iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            vec![
                "session_started",
                "tick",
                "tick",
                "student_marked",
                "session_paused",
                "session_resumed",
                "mark_undone",
                "session_completed",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn completed_event_carries_absentees() {
        let (session, ids, mut rx, _classes) = fixture(3, false);
        session.start().unwrap();
        session.mark_manually(&ids[1]).unwrap();
        session.stop().unwrap();

        let events = drain(&mut rx);
        let completed = events
            .iter()
            .find(|e| e.event_type() == "session_completed")
            .unwrap();
        match completed {
            SessionEvent::SessionCompleted {
                present_count,
                total_students,
                absentees,
                ..
            } => {
                assert_eq!(*present_count, 1);
                assert_eq!(*total_students, 3);
                assert_eq!(absentees, &vec![ids[0].clone(), ids[2].clone()]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn marks_write_back_to_class_derived_count() {
        let (session, ids, _rx, classes) = fixture(3, false);
        session.start().unwrap();
        session.mark_manually(&ids[0]).unwrap();
        session.mark_manually(&ids[1]).unwrap();

        let class = classes.get(session.class_id()).unwrap().clone();
        assert_eq!(class.present_count, 2);

        session.undo_last().unwrap();
        let class = classes.get(session.class_id()).unwrap().clone();
        assert_eq!(class.present_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_summary_is_queryable_after_stop() {
        let (session, ids, _rx, _classes) = fixture(2, false);
        assert!(session.completion().is_none());
        session.start().unwrap();
        session.mark_manually(&ids[0]).unwrap();
        session.stop().unwrap();

        let summary = session.completion().unwrap();
        assert_eq!(summary.present_count, 1);
        assert_eq!(summary.absentees.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_pause_leaves_phase_unchanged() {
        let (session, _ids, _rx, _classes) = fixture(3, false);
        session.start().unwrap();
        ticks(2).await;
        // Teardown stops the clock but the phase stays Active, so the
        // clock transition inside pause() is the part that fails.
        session.shutdown();

        assert_eq!(session.pause().unwrap_err(), SessionError::ClockNotRunning);
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.elapsed_seconds(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_timers_without_completing() {
        let (session, _ids, _rx, _classes) = fixture(10, true);
        session.start().unwrap();
        ticks(2).await;
        session.shutdown();

        let elapsed = session.elapsed_seconds();
        ticks(5).await;
        assert_eq!(session.elapsed_seconds(), elapsed);
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.auto_marked_count(), session.present_count());
    }
}
