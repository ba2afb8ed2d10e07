use chrono::NaiveDateTime;
use sqlx::FromRow;

pub const ROLE_ADMIN: &str = "A";
pub const ROLE_SUBMITTER: &str = "S";

/// An account. Role is fixed at creation; passwords are stored as bcrypt
/// hashes, never in the clear.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn is_submitter(&self) -> bool {
        self.role == ROLE_SUBMITTER
    }
}
