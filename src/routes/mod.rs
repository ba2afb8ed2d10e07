use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::create_security_headers_layer;
use crate::handlers::{admin, auth, events, submissions};
use crate::state::AppState;
use crate::upload::MAX_IMAGE_BYTES;

/// Headroom above the image cap for the rest of the multipart fields.
const BODY_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

pub fn create_routes(state: AppState) -> Router {
    let public_dir = state.public_dir.as_ref().clone();

    Router::new()
        .route("/", get(events::listing))
        .route("/events", get(events::listing))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route(
            "/submit-event",
            get(submissions::submit_event_page).post(submissions::submit_event),
        )
        .route("/submitter/dashboard", get(submissions::dashboard))
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/create", get(admin::create_page).post(admin::create))
        .route("/admin/edit/:id", get(admin::edit_page).post(admin::edit))
        .route("/admin/delete/:id", post(admin::delete))
        .route("/admin/submissions/:id/approve", post(admin::approve))
        .route("/admin/submissions/:id/deny", post(admin::deny))
        // CSS and uploaded images; anything unmatched falls through here.
        .fallback_service(ServeDir::new(public_dir))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer())
        .with_state(state)
}
