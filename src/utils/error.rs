use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Last-resort request failure. Most storage errors are handled inside the
/// handlers (the page re-renders with a generic message); anything that
/// escapes to the boundary ends up here and becomes a plain error page.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Template error")]
    Template(#[from] askama::Error),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Password hashing error")]
    Password(#[from] bcrypt::BcryptError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn log(&self) {
        match self {
            AppError::Database(e) => error!(error = ?e, "Database error"),
            AppError::Template(e) => error!(error = ?e, "Template error"),
            AppError::Io(e) => error!(error = ?e, "I/O error"),
            AppError::Password(e) => error!(error = ?e, "Password hashing error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal details; the visitor only sees a generic page.
        self.log();

        (
            self.status_code(),
            Html("<h1>Something went wrong</h1><p>Please try again later.</p>".to_string()),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_variants_are_internal_errors() {
        let err = AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
