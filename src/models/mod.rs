pub mod event;
pub mod event_type;
pub mod submission;
pub mod user;

pub use event::{Event, EventRow};
pub use event_type::EventType;
pub use submission::{Submission, SubmissionRow, SubmissionStatus};
pub use user::{User, ROLE_ADMIN, ROLE_SUBMITTER};
