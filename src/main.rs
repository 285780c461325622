use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;

use rollcall_core::config::PolicyConfig;
use rollcall_core::model::ClassStatus;
use rollcall_engine::SessionCoordinator;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting rollcall");

    let coordinator = SessionCoordinator::new(PolicyConfig::default());

    let now = chrono::Utc::now();
    for (class, roster) in rollcall_engine::fixtures::sample_classes(now) {
        coordinator.load_class(class, roster);
    }
    for class in coordinator.classes() {
        tracing::info!(
            subject = %class.subject,
            section = %class.section,
            room = %class.room,
            status = %class.status,
            students = class.total_students,
            "class loaded"
        );
    }

    // Log every session event as it happens. A lagged receiver skips
    // ahead rather than giving up.
    let mut events = coordinator.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    tracing::info!(
                        event = event.event_type(),
                        session_id = %event.session_id(),
                        "session event"
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event logger fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let ongoing = coordinator
        .classes()
        .into_iter()
        .find(|c| c.status == ClassStatus::Ongoing)
        .expect("fixtures include an ongoing class");

    let session = coordinator
        .open(&ongoing.id, true)
        .expect("failed to open attendance session");
    session.start().expect("failed to start session");
    tracing::info!(subject = %ongoing.subject, "attendance session running");

    tokio::time::sleep(Duration::from_secs(3)).await;
    session.pause().expect("failed to pause");
    tracing::info!(elapsed = %session.format_elapsed(), "paused");

    tokio::time::sleep(Duration::from_secs(1)).await;
    session.resume().expect("failed to resume");

    tokio::time::sleep(Duration::from_secs(2)).await;
    if let Some(student) = session.remaining().first() {
        session
            .mark_manually(&student.id)
            .expect("failed to mark student");
        tracing::info!(name = %student.name, "marked manually");
    }

    let summary = session.stop().expect("failed to stop session");
    tracing::info!(
        present = summary.present_count,
        total = summary.total_students,
        absent = summary.absentees.len(),
        duration = summary.duration_seconds,
        "session completed"
    );
    for student in &summary.absentees {
        tracing::info!(name = %student.name, roll_no = %student.roll_no, "absent");
    }

    coordinator.shutdown_all();
    tracing::info!("Shutting down");
}
