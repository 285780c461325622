use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use rollcall_core::errors::SessionError;
use rollcall_core::events::SessionEvent;
use rollcall_core::ids::SessionId;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// A cancellable 1-second ticker for one attendance session.
///
/// Each tick adds exactly 1 to the elapsed counter and emits one `Tick`
/// event. The previous ticker task is always cancelled before a new one
/// is spawned, so rapid pause/resume cannot drift or double-fire.
#[derive(Debug)]
pub struct SessionClock {
    session_id: SessionId,
    elapsed: Arc<AtomicU64>,
    event_tx: broadcast::Sender<SessionEvent>,
    ticker: Option<CancellationToken>,
}

impl SessionClock {
    pub fn new(session_id: SessionId, event_tx: broadcast::Sender<SessionEvent>) -> Self {
        Self {
            session_id,
            elapsed: Arc::new(AtomicU64::new(0)),
            event_tx,
            ticker: None,
        }
    }

    /// Begin ticking from the current elapsed value. Must be called from
    /// within a tokio runtime. Fails if the clock is already running.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.ticker.is_some() {
            return Err(SessionError::ClockAlreadyRunning);
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let elapsed = Arc::clone(&self.elapsed);
        let tx = self.event_tx.clone();
        let session_id = self.session_id.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; consume it so the
            // first increment lands a full interval after start.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let secs = elapsed.fetch_add(1, Ordering::SeqCst) + 1;
                        let event = SessionEvent::Tick {
                            session_id: session_id.clone(),
                            elapsed_seconds: secs,
                        };
                        if tx.send(event).is_err() {
                            debug!("no event receivers — tick dropped");
                        }
                    }
                }
            }
        });

        self.ticker = Some(cancel);
        Ok(())
    }

    /// Stop ticking, preserving the elapsed value. Fails if not running.
    pub fn pause(&mut self) -> Result<(), SessionError> {
        let ticker = self.ticker.take().ok_or(SessionError::ClockNotRunning)?;
        ticker.cancel();
        Ok(())
    }

    /// Same contract as `start()`: continues from the preserved elapsed
    /// value rather than beginning a fresh count.
    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.start()
    }

    /// Cancel the ticker (if any) and reset elapsed to 0. End-of-session
    /// semantics: elapsed time is not retained across sessions.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        self.elapsed.store(0, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.load(Ordering::SeqCst)
    }

    /// "mm:ss" rendering for the timer display.
    pub fn format_elapsed(&self) -> String {
        format_elapsed(self.elapsed_seconds())
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}

pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
