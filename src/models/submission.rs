use std::fmt;

use chrono::NaiveDateTime;
use sqlx::FromRow;

/// Moderation state of a submission. `Pending` is the only state with
/// outgoing transitions; `Approved` and `Denied` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Denied,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Denied => "denied",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitter-proposed event awaiting review. On approval its descriptive
/// fields are copied into a new events row; the two rows are independent
/// afterwards.
#[derive(Debug, Clone, FromRow)]
pub struct Submission {
    pub id: i32,
    pub submitter_id: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub name: String,
    pub description: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub location: String,
    pub host: Option<String>,
    pub url: Option<String>,
    pub link_text: Option<String>,
    pub image_path: Option<String>,
    pub event_type_id: Option<i32>,
}

/// Review-queue row: a submission joined with its type name and the
/// submitting user's email.
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRow {
    pub id: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub name: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub location: String,
    pub host: Option<String>,
    pub url: Option<String>,
    pub link_text: Option<String>,
    pub type_name: Option<String>,
    pub submitter_email: Option<String>,
}
