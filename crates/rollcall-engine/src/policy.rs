use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use rollcall_core::config::PolicyConfig;
use rollcall_core::errors::SessionError;
use rollcall_core::events::SessionEvent;
use rollcall_core::ids::{SessionId, StudentId};
use rollcall_core::model::{MarkSource, Phase};

use crate::session::SessionState;

/// Which transition fired the policy. Start marks a larger slice of the
/// remaining roster than resume; both are staggered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Start,
    Resume,
}

/// Simulated digital check-ins: on start and on resume, mark a fraction
/// of the still-absent roster present, one student at a time at a fixed
/// stagger interval, through the same mark operation manual marking uses.
///
/// At most one staggered run is pending at a time; triggering again or
/// cancelling always tears down the previous run's timer first.
#[derive(Debug)]
pub struct AutoMarkPolicy {
    config: PolicyConfig,
    pending: Option<CancellationToken>,
}

impl AutoMarkPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config,
            pending: None,
        }
    }

    /// How many students a trigger will mark: `min(R, ceil(R * fraction))`.
    pub fn quota(&self, remaining: usize, trigger: Trigger) -> usize {
        let fraction = match trigger {
            Trigger::Start => self.config.start_fraction,
            Trigger::Resume => self.config.resume_fraction,
        };
        if remaining == 0 {
            return 0;
        }
        (((remaining as f64) * fraction).ceil() as usize).min(remaining)
    }

    /// Snapshot the current remaining list and spawn the staggered run.
    /// A no-op when nothing remains to mark.
    pub(crate) fn trigger(
        &mut self,
        trigger: Trigger,
        session_id: SessionId,
        state: Arc<Mutex<SessionState>>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) {
        self.cancel_pending();

        let stagger = match trigger {
            Trigger::Start => self.config.start_stagger,
            Trigger::Resume => self.config.resume_stagger,
        };
        let targets: Vec<StudentId> = {
            let st = state.lock();
            let quota = self.quota(st.roster.remaining_count() as usize, trigger);
            st.roster
                .remaining()
                .iter()
                .take(quota)
                .map(|s| s.id.clone())
                .collect()
        };
        if targets.is_empty() {
            return;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            for student_id in targets {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(stagger) => {}
                }

                let mut st = state.lock();
                // A timer racing a phase transition must never mark a
                // paused or completed session.
                if st.phase != Phase::Active {
                    return;
                }
                match st.apply_mark(&student_id, MarkSource::Auto) {
                    Ok(present_count) => {
                        let event = SessionEvent::StudentMarked {
                            session_id: session_id.clone(),
                            student_id: student_id.clone(),
                            source: MarkSource::Auto,
                            present_count,
                        };
                        if event_tx.send(event).is_err() {
                            debug!("no event receivers — auto mark dropped");
                        }
                    }
                    Err(SessionError::AlreadyMarked(_)) => {
                        debug!(student = %student_id, "auto mark skipped — already present");
                    }
                    Err(e) => {
                        debug!(student = %student_id, error = %e, "auto mark skipped");
                    }
                }
            }
        });
        self.pending = Some(cancel);
    }

    /// Cancel any staggered marks that have not fired yet.
    pub fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for AutoMarkPolicy {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
