use chrono::NaiveDateTime;
use sqlx::FromRow;

/// A row in the canonical events table. Global once created; any admin may
/// edit or delete it.
#[derive(Debug, Clone, FromRow)]
pub struct Event {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub location: String,
    pub host: Option<String>,
    pub url: Option<String>,
    pub link_text: Option<String>,
    pub image_path: Option<String>,
    pub event_type_id: Option<i32>,
}

/// Listing row: an event joined with its type name.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub location: String,
    pub host: Option<String>,
    pub url: Option<String>,
    pub link_text: Option<String>,
    pub image_path: Option<String>,
    pub event_type_id: Option<i32>,
    pub type_name: Option<String>,
}
