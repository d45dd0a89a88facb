mod machine;
mod selector;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use machine::{BatchSegment, SessionBatch, SessionEvent, SessionPhase, SessionState};
pub use selector::{BatchBuilder, ReviewSelector, Selection};
pub use view::{SessionSummaryId, SessionSummaryListItem, SessionSummaryService};
pub use workflow::{CommitResult, ReviewSession, SessionLoopService};
