//! Credential routes: the combined login/signup view, session creation and
//! teardown. Login failures never say which half of the credentials was
//! wrong.

use askama::Template;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::SignedCookieJar;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::db;
use crate::session::{expired_session_cookie, session_cookie, AuthSession, SESSION_COOKIE};
use crate::state::AppState;
use crate::utils::render::render_html;

// bcrypt in debug builds is excruciatingly slow, so development gets a
// low cost and release builds a real one (same trade punch-web makes).
#[cfg(debug_assertions)]
const BCRYPT_COST: u32 = 6;
#[cfg(not(debug_assertions))]
const BCRYPT_COST: u32 = 12;

pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to access this page";

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    error_message: String,
    signup_error_message: String,
    active_form: &'static str,
}

/// Render the combined login/signup view with one of its panes active.
pub fn login_view(login_error: &str, signup_error: &str, active_form: &'static str) -> Response {
    render_html(LoginTemplate {
        error_message: login_error.to_string(),
        signup_error_message: signup_error.to_string(),
        active_form,
    })
}

/// The in-place response for a protected page hit without a session:
/// the login view, deliberately served with HTTP 200.
pub fn login_required_response() -> Response {
    login_view(LOGIN_REQUIRED_MESSAGE, "", "login")
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

pub async fn login_page() -> Response {
    login_view("", "", "login")
}

pub async fn signup_page() -> Response {
    login_view("", "", "signup")
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    axum::Form(form): axum::Form<LoginForm>,
) -> Response {
    let email = form.email.trim().to_lowercase();
    if email.is_empty() || form.password.is_empty() {
        return login_view("Please enter both email and password.", "", "login");
    }

    let invalid = || login_view("Invalid login", "", "login");

    let user = match db::find_user_by_email(&state.pool, &email).await {
        Ok(Some(user)) => user,
        Ok(None) => return invalid(),
        Err(e) => {
            error!(error = ?e, "login lookup failed");
            return invalid();
        }
    };

    if !bcrypt::verify(&form.password, &user.password_hash).unwrap_or(false) {
        return invalid();
    }

    if user.is_admin() {
        let id = state.sessions.insert(AuthSession::Admin { email: user.email });
        (jar.add(session_cookie(id)), Redirect::to("/admin/dashboard")).into_response()
    } else {
        let id = state.sessions.insert(AuthSession::Submitter {
            id: user.id,
            email: user.email,
        });
        (
            jar.add(session_cookie(id)),
            Redirect::to("/submitter/dashboard"),
        )
            .into_response()
    }
}

#[derive(Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default, rename = "confirmPassword")]
    confirm_password: String,
}

pub async fn signup(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    axum::Form(form): axum::Form<SignupForm>,
) -> Response {
    let email = form.email.trim().to_lowercase();
    if email.is_empty() || form.password.is_empty() || form.confirm_password.is_empty() {
        return login_view("", "All fields are required.", "signup");
    }
    if form.password != form.confirm_password {
        return login_view("", "Passwords do not match.", "signup");
    }

    match db::find_user_by_email(&state.pool, &email).await {
        Ok(Some(_)) => {
            return login_view("", "That email is already registered.", "signup");
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = ?e, "signup lookup failed");
            return login_view("", "Unable to create account.", "signup");
        }
    }

    let password_hash = match hash_password(&form.password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = ?e, "password hashing failed");
            return login_view("", "Unable to create account.", "signup");
        }
    };

    match db::insert_submitter(&state.pool, &email, &password_hash).await {
        Ok(new_id) => {
            let id = state.sessions.insert(AuthSession::Submitter {
                id: new_id,
                email,
            });
            (jar.add(session_cookie(id)), Redirect::to("/submit-event")).into_response()
        }
        Err(e) => {
            // Covers the insert racing another signup for the same email.
            error!(error = ?e, "signup insert failed");
            login_view("", "Unable to create account.", "signup")
        }
    }
}

#[derive(Deserialize)]
pub struct LogoutParams {
    #[serde(default)]
    next: String,
}

/// Only same-site paths are honored as a post-logout destination. A
/// protocol-relative `//host` is not a local path.
pub fn sanitize_return_target(requested: &str) -> &str {
    if requested.starts_with('/') && !requested.starts_with("//") {
        requested
    } else {
        "/"
    }
}

pub async fn logout(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(params): Query<LogoutParams>,
) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Ok(id) = Uuid::parse_str(cookie.value()) {
            state.sessions.remove(&id);
        }
    }
    let jar = jar.remove(expired_session_cookie());
    (jar, Redirect::to(sanitize_return_target(&params.next))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_target_must_be_a_local_path() {
        assert_eq!(sanitize_return_target("/events"), "/events");
        assert_eq!(sanitize_return_target("/admin/dashboard"), "/admin/dashboard");
        assert_eq!(sanitize_return_target("https://evil.example"), "/");
        assert_eq!(sanitize_return_target("//evil.example"), "/");
        assert_eq!(sanitize_return_target(""), "/");
    }

    #[test]
    fn hashed_passwords_verify_and_never_store_the_clear_text() {
        let hash = hash_password("hunter2").unwrap();
        assert!(!hash.contains("hunter2"));
        assert!(bcrypt::verify("hunter2", &hash).unwrap());
        assert!(!bcrypt::verify("hunter3", &hash).unwrap());
    }
}
