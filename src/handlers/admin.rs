//! Admin routes: catalog CRUD and the moderation queue. Every handler
//! checks the session context first; moderation no-ops and storage
//! failures all land back on the dashboard.

use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use chrono::NaiveDateTime;
use tracing::error;

use crate::db::{self, EventInput};
use crate::handlers::auth::login_required_response;
use crate::handlers::forms::{read_event_form, validate_event_form, EventFormData, ValidatedEvent};
use crate::models::{Event, EventRow, EventType, SubmissionRow, SubmissionStatus};
use crate::session::{admin_gate, AuthSession, GateOutcome};
use crate::state::AppState;
use crate::upload;
use crate::utils::datetime::{format_datetime_local, now_civil};
use crate::utils::render::render_html;

const DASHBOARD: &str = "/admin/dashboard";

/// Resolve the admin gate to a response. Submitters land on their own
/// dashboard, never on an admin page; anonymous visitors get the login
/// view in place.
fn gate(auth: &AuthSession) -> Result<(), Response> {
    match admin_gate(auth) {
        GateOutcome::Allow => Ok(()),
        GateOutcome::ToSubmitterDashboard => {
            Err(Redirect::to("/submitter/dashboard").into_response())
        }
        _ => Err(login_required_response()),
    }
}

fn parse_id(raw: &str) -> Option<i32> {
    raw.parse().ok()
}

/// Upcoming first, past second. The query returns all events sorted by
/// start time; the split happens here, not in SQL.
fn partition_events(events: Vec<EventRow>, now: NaiveDateTime) -> (Vec<EventRow>, Vec<EventRow>) {
    events.into_iter().partition(|event| event.end_time > now)
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
struct AdminDashboardTemplate {
    upcoming_events: Vec<EventRow>,
    past_events: Vec<EventRow>,
    pending_submissions: Vec<SubmissionRow>,
    denied_submissions: Vec<SubmissionRow>,
    pending_count: usize,
    error_message: String,
}

pub async fn dashboard(State(state): State<AppState>, auth: AuthSession) -> Response {
    if let Err(response) = gate(&auth) {
        return response;
    }

    let loaded = tokio::try_join!(
        db::list_all_events(&state.pool),
        db::list_submissions_by_status(&state.pool, SubmissionStatus::Pending, false),
        db::list_submissions_by_status(&state.pool, SubmissionStatus::Denied, true),
    );

    match loaded {
        Ok((events, pending_submissions, denied_submissions)) => {
            let (upcoming_events, past_events) = partition_events(events, now_civil());
            let pending_count = pending_submissions.len();
            render_html(AdminDashboardTemplate {
                upcoming_events,
                past_events,
                pending_submissions,
                denied_submissions,
                pending_count,
                error_message: String::new(),
            })
        }
        Err(e) => {
            error!(error = ?e, "failed to load admin dashboard");
            render_html(AdminDashboardTemplate {
                upcoming_events: Vec::new(),
                past_events: Vec::new(),
                pending_submissions: Vec::new(),
                denied_submissions: Vec::new(),
                pending_count: 0,
                error_message: "Database error loading events.".to_string(),
            })
        }
    }
}

#[derive(Template)]
#[template(path = "admin_create.html")]
struct AdminCreateTemplate {
    event_types: Vec<EventType>,
    error_message: String,
    form: EventFormData,
}

async fn render_create_view(
    state: &AppState,
    error_message: String,
    form: EventFormData,
) -> Response {
    match db::list_event_types(&state.pool).await {
        Ok(event_types) => render_html(AdminCreateTemplate {
            event_types,
            error_message,
            form,
        }),
        Err(e) => {
            error!(error = ?e, "failed to load event types");
            render_html(AdminCreateTemplate {
                event_types: Vec::new(),
                error_message: "Database error loading event types.".to_string(),
                form,
            })
        }
    }
}

pub async fn create_page(State(state): State<AppState>, auth: AuthSession) -> Response {
    if let Err(response) = gate(&auth) {
        return response;
    }
    render_create_view(&state, String::new(), EventFormData::default()).await
}

fn event_input(validated: ValidatedEvent, image_path: Option<String>) -> EventInput {
    EventInput {
        name: validated.name,
        description: validated.description,
        start_time: validated.start_time,
        end_time: validated.end_time,
        location: validated.location,
        host: validated.host,
        url: validated.url,
        link_text: validated.link_text,
        image_path,
        event_type_id: validated.event_type_id,
    }
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthSession,
    multipart: Multipart,
) -> Response {
    if let Err(response) = gate(&auth) {
        return response;
    }

    let (form, staged) = match read_event_form(multipart, &state.uploads_dir).await {
        Ok(parsed) => parsed,
        Err(e) => {
            return render_create_view(&state, e.to_string(), EventFormData::default()).await;
        }
    };

    let validated = match validate_event_form(&form, false) {
        Ok(validated) => validated,
        Err(message) => {
            if let Some(image) = staged {
                image.discard().await;
            }
            return render_create_view(&state, message.to_string(), form).await;
        }
    };

    let input = event_input(
        validated,
        staged.as_ref().map(|image| image.public_path.clone()),
    );

    match db::insert_event(&state.pool, &input).await {
        Ok(()) => Redirect::to(DASHBOARD).into_response(),
        Err(e) => {
            error!(error = ?e, "failed to create event");
            if let Some(image) = staged {
                image.discard().await;
            }
            render_create_view(
                &state,
                "Failed to create event. Please check your input and try again.".to_string(),
                form,
            )
            .await
        }
    }
}

#[derive(Template)]
#[template(path = "admin_edit.html")]
struct AdminEditTemplate {
    event_id: i32,
    image_path: Option<String>,
    event_types: Vec<EventType>,
    error_message: String,
    form: EventFormData,
}

fn form_from_event(event: &Event) -> EventFormData {
    EventFormData {
        name: event.name.clone(),
        description: event.description.clone().unwrap_or_default(),
        start_time: format_datetime_local(event.start_time),
        end_time: format_datetime_local(event.end_time),
        location: event.location.clone(),
        host: event.host.clone().unwrap_or_default(),
        event_type_id: event
            .event_type_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        url: event.url.clone().unwrap_or_default(),
        link_text: event.link_text.clone().unwrap_or_default(),
    }
}

async fn render_edit_view(
    state: &AppState,
    event_id: i32,
    image_path: Option<String>,
    error_message: String,
    form: EventFormData,
) -> Response {
    match db::list_event_types(&state.pool).await {
        Ok(event_types) => render_html(AdminEditTemplate {
            event_id,
            image_path,
            event_types,
            error_message,
            form,
        }),
        Err(e) => {
            error!(error = ?e, "failed to load event types");
            Redirect::to(DASHBOARD).into_response()
        }
    }
}

pub async fn edit_page(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = gate(&auth) {
        return response;
    }
    let Some(id) = parse_id(&id) else {
        return Redirect::to(DASHBOARD).into_response();
    };

    match db::get_event(&state.pool, id).await {
        Ok(Some(event)) => {
            let form = form_from_event(&event);
            render_edit_view(&state, event.id, event.image_path.clone(), String::new(), form).await
        }
        Ok(None) => Redirect::to(DASHBOARD).into_response(),
        Err(e) => {
            error!(error = ?e, "failed to load event for edit");
            Redirect::to(DASHBOARD).into_response()
        }
    }
}

pub async fn edit(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    if let Err(response) = gate(&auth) {
        return response;
    }
    let Some(id) = parse_id(&id) else {
        return Redirect::to(DASHBOARD).into_response();
    };

    let (form, staged) = match read_event_form(multipart, &state.uploads_dir).await {
        Ok(parsed) => parsed,
        Err(e) => {
            return render_edit_view(&state, id, None, e.to_string(), EventFormData::default())
                .await;
        }
    };

    // The row must still exist, and its current image decides what a
    // no-upload edit preserves.
    let existing = match db::get_event(&state.pool, id).await {
        Ok(Some(event)) => event,
        Ok(None) => {
            if let Some(image) = staged {
                image.discard().await;
            }
            return Redirect::to(DASHBOARD).into_response();
        }
        Err(e) => {
            error!(error = ?e, "failed to load event for update");
            if let Some(image) = staged {
                image.discard().await;
            }
            return Redirect::to(DASHBOARD).into_response();
        }
    };

    let validated = match validate_event_form(&form, false) {
        Ok(validated) => validated,
        Err(message) => {
            if let Some(image) = staged {
                image.discard().await;
            }
            return render_edit_view(
                &state,
                id,
                existing.image_path.clone(),
                message.to_string(),
                form,
            )
            .await;
        }
    };

    let image_path = match &staged {
        Some(image) => Some(image.public_path.clone()),
        None => existing.image_path.clone(),
    };
    let input = event_input(validated, image_path);

    match db::update_event(&state.pool, id, &input).await {
        Ok(()) => {
            // The new file is live; now the replaced one can go.
            if staged.is_some() {
                if let Some(old_path) = &existing.image_path {
                    upload::remove_public_file(&state.public_dir, old_path).await;
                }
            }
            Redirect::to(DASHBOARD).into_response()
        }
        Err(e) => {
            error!(error = ?e, "failed to update event");
            if let Some(image) = staged {
                image.discard().await;
            }
            render_edit_view(
                &state,
                id,
                existing.image_path.clone(),
                "Failed to update event. Please check your input and try again.".to_string(),
                form,
            )
            .await
        }
    }
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = gate(&auth) {
        return response;
    }
    let Some(id) = parse_id(&id) else {
        return Redirect::to(DASHBOARD).into_response();
    };

    match db::delete_event(&state.pool, id).await {
        Ok(Some(image_path)) => {
            upload::remove_public_file(&state.public_dir, &image_path).await;
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = ?e, "failed to delete event");
        }
    }
    Redirect::to(DASHBOARD).into_response()
}

pub async fn approve(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = gate(&auth) {
        return response;
    }
    let Some(id) = parse_id(&id) else {
        return Redirect::to(DASHBOARD).into_response();
    };

    // A non-pending submission is a silent no-op; the dashboard already
    // shows its state.
    if let Err(e) = db::approve_submission(&state.pool, id).await {
        error!(error = ?e, submission = id, "failed to approve submission");
    }
    Redirect::to(DASHBOARD).into_response()
}

pub async fn deny(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = gate(&auth) {
        return response;
    }
    let Some(id) = parse_id(&id) else {
        return Redirect::to(DASHBOARD).into_response();
    };

    if let Err(e) = db::deny_submission(&state.pool, id).await {
        error!(error = ?e, submission = id, "failed to deny submission");
    }
    Redirect::to(DASHBOARD).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(id: i32, end: NaiveDateTime) -> EventRow {
        EventRow {
            id,
            name: format!("event {id}"),
            description: None,
            start_time: end - chrono::Duration::hours(2),
            end_time: end,
            location: "Union".to_string(),
            host: None,
            url: None,
            link_text: None,
            image_path: None,
            event_type_id: Some(1),
            type_name: Some("Social".to_string()),
        }
    }

    #[test]
    fn partition_splits_on_end_time_against_now() {
        let now = NaiveDate::from_ymd_opt(2026, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let events = vec![
            event(1, now - chrono::Duration::hours(1)),
            event(2, now),
            event(3, now + chrono::Duration::hours(1)),
        ];

        let (upcoming, past) = partition_events(events, now);
        assert_eq!(upcoming.iter().map(|e| e.id).collect::<Vec<_>>(), vec![3]);
        // An event ending exactly now is already past.
        assert_eq!(past.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn bad_ids_do_not_parse() {
        assert_eq!(parse_id("12"), Some(12));
        assert_eq!(parse_id("twelve"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn edit_form_round_trips_stored_values() {
        let stored = Event {
            id: 9,
            name: "Career Fair".to_string(),
            description: Some("All majors welcome.".to_string()),
            start_time: NaiveDate::from_ymd_opt(2026, 10, 2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            end_time: NaiveDate::from_ymd_opt(2026, 10, 2)
                .unwrap()
                .and_hms_opt(15, 30, 0)
                .unwrap(),
            location: "Field House".to_string(),
            host: None,
            url: Some("https://example.edu/fair".to_string()),
            link_text: None,
            image_path: None,
            event_type_id: Some(4),
        };

        let form = form_from_event(&stored);
        assert_eq!(form.start_time, "2026-10-02T09:00");
        assert_eq!(form.end_time, "2026-10-02T15:30");
        assert_eq!(form.event_type_id, "4");
        assert_eq!(form.host, "");
        assert_eq!(form.url, "https://example.edu/fair");
    }
}
