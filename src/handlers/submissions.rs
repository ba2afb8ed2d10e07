//! Submitter-facing routes: the submission form and the submitter's own
//! dashboard. Submissions enter the moderation queue as `pending`.

use askama::Template;
use axum::extract::{Multipart, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use tracing::error;

use crate::db::{self, EventInput};
use crate::handlers::auth::login_required_response;
use crate::handlers::forms::{read_event_form, validate_event_form, EventFormData};
use crate::models::{EventType, SubmissionRow};
use crate::session::{submitter_gate, AuthSession, GateOutcome};
use crate::state::AppState;
use crate::utils::render::render_html;

const SUBMIT_THANKS_MESSAGE: &str = "Thanks! We'll review your submission shortly.";

#[derive(Deserialize)]
pub struct NoticeParams {
    #[serde(default)]
    success: String,
}

#[derive(Template)]
#[template(path = "submit_event.html")]
struct SubmitEventTemplate {
    event_types: Vec<EventType>,
    submissions: Vec<SubmissionRow>,
    success_message: String,
    error_message: String,
    form: EventFormData,
}

#[derive(Template)]
#[template(path = "submitter_dashboard.html")]
struct SubmitterDashboardTemplate {
    submissions: Vec<SubmissionRow>,
    submitter_email: String,
    success_message: String,
    error_message: String,
}

/// Render the submission form together with the submitter's queue. A load
/// failure still renders, with a notice instead of the dropdown data.
async fn render_submit_view(
    state: &AppState,
    submitter_id: i32,
    success_message: String,
    error_message: String,
    form: EventFormData,
) -> Response {
    let loaded = tokio::try_join!(
        db::list_event_types(&state.pool),
        db::list_submissions_for_submitter(&state.pool, submitter_id),
    );

    match loaded {
        Ok((event_types, submissions)) => render_html(SubmitEventTemplate {
            event_types,
            submissions,
            success_message,
            error_message,
            form,
        }),
        Err(e) => {
            error!(error = ?e, "failed to load submit-event data");
            render_html(SubmitEventTemplate {
                event_types: Vec::new(),
                submissions: Vec::new(),
                success_message: String::new(),
                error_message: "Unable to load event types. Please try again later.".to_string(),
                form,
            })
        }
    }
}

pub async fn submit_event_page(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(params): Query<NoticeParams>,
) -> Response {
    let AuthSession::Submitter { id, .. } = auth else {
        return Redirect::to("/signup").into_response();
    };

    let success_message = if params.success.is_empty() {
        String::new()
    } else {
        SUBMIT_THANKS_MESSAGE.to_string()
    };

    render_submit_view(
        &state,
        id,
        success_message,
        String::new(),
        EventFormData::default(),
    )
    .await
}

pub async fn submit_event(
    State(state): State<AppState>,
    auth: AuthSession,
    multipart: Multipart,
) -> Response {
    let AuthSession::Submitter { id: submitter_id, .. } = auth else {
        return Redirect::to("/signup").into_response();
    };

    let (form, staged) = match read_event_form(multipart, &state.uploads_dir).await {
        Ok(parsed) => parsed,
        Err(e) => {
            // Any staged file was already discarded by the reader.
            return render_submit_view(
                &state,
                submitter_id,
                String::new(),
                e.to_string(),
                EventFormData::default(),
            )
            .await;
        }
    };

    let validated = match validate_event_form(&form, true) {
        Ok(validated) => validated,
        Err(message) => {
            if let Some(image) = staged {
                image.discard().await;
            }
            return render_submit_view(
                &state,
                submitter_id,
                String::new(),
                message.to_string(),
                form,
            )
            .await;
        }
    };

    let input = EventInput {
        name: validated.name,
        description: validated.description,
        start_time: validated.start_time,
        end_time: validated.end_time,
        location: validated.location,
        host: validated.host,
        url: validated.url,
        link_text: validated.link_text,
        image_path: staged.as_ref().map(|image| image.public_path.clone()),
        event_type_id: validated.event_type_id,
    };

    match db::insert_submission(&state.pool, submitter_id, &input).await {
        Ok(()) => Redirect::to("/submitter/dashboard?success=1").into_response(),
        Err(e) => {
            error!(error = ?e, "failed to save submission");
            if let Some(image) = staged {
                image.discard().await;
            }
            render_submit_view(
                &state,
                submitter_id,
                String::new(),
                "Unable to submit your event. Please try again later.".to_string(),
                form,
            )
            .await
        }
    }
}

pub async fn dashboard(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(params): Query<NoticeParams>,
) -> Response {
    if submitter_gate(&auth) != GateOutcome::Allow {
        // Deliberately in place with HTTP 200, not a redirect.
        return login_required_response();
    }
    let AuthSession::Submitter { id, email } = auth else {
        return login_required_response();
    };

    let success_message = if params.success.is_empty() {
        String::new()
    } else {
        SUBMIT_THANKS_MESSAGE.to_string()
    };

    match db::list_submissions_for_submitter(&state.pool, id).await {
        Ok(submissions) => render_html(SubmitterDashboardTemplate {
            submissions,
            submitter_email: email,
            success_message,
            error_message: String::new(),
        }),
        Err(e) => {
            error!(error = ?e, "failed to load submitter dashboard");
            render_html(SubmitterDashboardTemplate {
                submissions: Vec::new(),
                submitter_email: email,
                success_message: String::new(),
                error_message: "Unable to load your submissions right now.".to_string(),
            })
        }
    }
}
