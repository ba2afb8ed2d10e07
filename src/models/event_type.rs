use sqlx::FromRow;

/// Static lookup data for the category filter and form dropdowns.
#[derive(Debug, Clone, FromRow)]
pub struct EventType {
    pub id: i32,
    pub name: String,
}
