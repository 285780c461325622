//! In-memory attendance session engine: roster, session clock, auto-mark
//! policy, the session state machine, and the coordinator that the
//! surrounding pages work against.

pub mod clock;
pub mod coordinator;
pub mod error;
pub mod fixtures;
pub mod policy;
pub mod roster;
pub mod session;

pub use clock::SessionClock;
pub use coordinator::SessionCoordinator;
pub use error::EngineError;
pub use policy::{AutoMarkPolicy, Trigger};
pub use roster::Roster;
pub use session::{AttendanceSession, CompletionSummary};
