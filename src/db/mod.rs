//! Data access. Handlers call these functions and turn failures into
//! rendered pages; nothing here panics on a bad row or a lost connection.

pub mod filter;

use chrono::NaiveDateTime;
use sqlx::PgPool;

use crate::models::{Event, EventRow, EventType, Submission, SubmissionRow, SubmissionStatus, User};

use filter::{build_events_query, EventFilter};

/// Field values for an insert or update of the events table, or for a new
/// submission. Image path is whatever the upload step staged, if anything.
#[derive(Debug, Clone)]
pub struct EventInput {
    pub name: String,
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub location: String,
    pub host: Option<String>,
    pub url: Option<String>,
    pub link_text: Option<String>,
    pub image_path: Option<String>,
    pub event_type_id: i32,
}

/// Result of an approve/deny action. `NotPending` covers a missing id as
/// well as a submission already moderated; callers redirect either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationOutcome {
    Applied,
    NotPending,
}

pub async fn list_event_types(pool: &PgPool) -> Result<Vec<EventType>, sqlx::Error> {
    sqlx::query_as("SELECT id, name FROM event_types ORDER BY name ASC")
        .fetch_all(pool)
        .await
}

/// The public listing: filtered, sorted, past events hidden.
pub async fn list_public_events(
    pool: &PgPool,
    filter: &EventFilter,
    now: NaiveDateTime,
) -> Result<Vec<EventRow>, sqlx::Error> {
    build_events_query(filter, now)
        .build_query_as::<EventRow>()
        .fetch_all(pool)
        .await
}

/// Every event, oldest start first, for the admin dashboard. The
/// upcoming/past split happens in memory, not in the query.
pub async fn list_all_events(pool: &PgPool) -> Result<Vec<EventRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT e.id, e.name, e.description, e.start_time, e.end_time, \
                e.location, e.host, e.url, e.link_text, e.image_path, e.event_type_id, \
                t.name AS type_name \
         FROM events e \
         LEFT JOIN event_types t ON e.event_type_id = t.id \
         ORDER BY e.start_time ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn get_event(pool: &PgPool, id: i32) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, name, description, start_time, end_time, location, \
                host, url, link_text, image_path, event_type_id \
         FROM events WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_event(pool: &PgPool, input: &EventInput) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO events \
             (name, description, start_time, end_time, location, host, url, link_text, image_path, event_type_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(&input.location)
    .bind(&input.host)
    .bind(&input.url)
    .bind(&input.link_text)
    .bind(&input.image_path)
    .bind(input.event_type_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_event(pool: &PgPool, id: i32, input: &EventInput) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE events SET \
             name = $1, description = $2, start_time = $3, end_time = $4, location = $5, \
             host = $6, url = $7, link_text = $8, image_path = $9, event_type_id = $10 \
         WHERE id = $11",
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(&input.location)
    .bind(&input.host)
    .bind(&input.url)
    .bind(&input.link_text)
    .bind(&input.image_path)
    .bind(input.event_type_id)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete an event and hand back its image path so the caller can remove
/// the file once the row is gone.
pub async fn delete_event(pool: &PgPool, id: i32) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("DELETE FROM events WHERE id = $1 RETURNING image_path")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(path,)| path))
}

pub async fn insert_submission(
    pool: &PgPool,
    submitter_id: i32,
    input: &EventInput,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO event_submissions \
             (submitter_id, status, name, description, start_time, end_time, location, \
              host, url, link_text, image_path, event_type_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(submitter_id)
    .bind(SubmissionStatus::Pending.as_str())
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(&input.location)
    .bind(&input.host)
    .bind(&input.url)
    .bind(&input.link_text)
    .bind(&input.image_path)
    .bind(input.event_type_id)
    .execute(pool)
    .await?;
    Ok(())
}

const SUBMISSION_ROW_COLUMNS: &str =
    "SELECT s.id, s.status, s.created_at, s.name, s.start_time, s.end_time, s.location, \
            s.host, s.url, s.link_text, t.name AS type_name, u.email AS submitter_email \
     FROM event_submissions s \
     LEFT JOIN event_types t ON s.event_type_id = t.id \
     LEFT JOIN users u ON s.submitter_id = u.id";

/// Review queue for the admin dashboard. Pending reads oldest-first so the
/// queue is worked in arrival order; denied reads newest-first.
pub async fn list_submissions_by_status(
    pool: &PgPool,
    status: SubmissionStatus,
    newest_first: bool,
) -> Result<Vec<SubmissionRow>, sqlx::Error> {
    let order = if newest_first { "DESC" } else { "ASC" };
    let sql = format!(
        "{SUBMISSION_ROW_COLUMNS} WHERE s.status = $1 ORDER BY s.created_at {order}"
    );
    sqlx::query_as(&sql).bind(status.as_str()).fetch_all(pool).await
}

/// A submitter's own submissions, newest first.
pub async fn list_submissions_for_submitter(
    pool: &PgPool,
    submitter_id: i32,
) -> Result<Vec<SubmissionRow>, sqlx::Error> {
    let sql = format!(
        "{SUBMISSION_ROW_COLUMNS} WHERE s.submitter_id = $1 ORDER BY s.created_at DESC"
    );
    sqlx::query_as(&sql).bind(submitter_id).fetch_all(pool).await
}

/// Approve a pending submission: claim it with an atomic conditional
/// update, copy its fields into a new events row, and commit both writes
/// together. Two concurrent approvals of the same id race on the claim;
/// the loser sees zero rows and backs off without a second event.
pub async fn approve_submission(pool: &PgPool, id: i32) -> Result<ModerationOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let claimed: Option<Submission> = sqlx::query_as(
        "UPDATE event_submissions SET status = $1 \
         WHERE id = $2 AND status = $3 \
         RETURNING id, submitter_id, status, created_at, name, description, \
                   start_time, end_time, location, host, url, link_text, \
                   image_path, event_type_id",
    )
    .bind(SubmissionStatus::Approved.as_str())
    .bind(id)
    .bind(SubmissionStatus::Pending.as_str())
    .fetch_optional(&mut *tx)
    .await?;

    let Some(submission) = claimed else {
        // Missing, already approved, or already denied. Dropping the
        // transaction rolls the claim attempt back (it matched nothing).
        return Ok(ModerationOutcome::NotPending);
    };

    sqlx::query(
        "INSERT INTO events \
             (name, description, start_time, end_time, location, host, url, link_text, image_path, event_type_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(&submission.name)
    .bind(&submission.description)
    .bind(submission.start_time)
    .bind(submission.end_time)
    .bind(&submission.location)
    .bind(&submission.host)
    .bind(&submission.url)
    .bind(&submission.link_text)
    .bind(&submission.image_path)
    .bind(submission.event_type_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(ModerationOutcome::Applied)
}

/// Deny a pending submission. Denying is only legal from `pending`; a
/// submission that was already approved keeps its status and its event.
pub async fn deny_submission(pool: &PgPool, id: i32) -> Result<ModerationOutcome, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE event_submissions SET status = $1 WHERE id = $2 AND status = $3",
    )
    .bind(SubmissionStatus::Denied.as_str())
    .bind(id)
    .bind(SubmissionStatus::Pending.as_str())
    .execute(pool)
    .await?;

    Ok(if result.rows_affected() == 0 {
        ModerationOutcome::NotPending
    } else {
        ModerationOutcome::Applied
    })
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, email, password_hash, role, created_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Create a submitter account, returning the new id.
pub async fn insert_submitter(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
) -> Result<i32, sqlx::Error> {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO users (email, password_hash, role) VALUES ($1, $2, 'S') RETURNING id",
    )
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// First-run admin seeding; a no-op when the email is already registered.
pub async fn ensure_admin(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (email, password_hash, role) VALUES ($1, $2, 'A') \
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(email)
    .bind(password_hash)
    .execute(pool)
    .await?;
    Ok(())
}
