/// Error types for blog-service
///
/// Every handler returns [`Result`]. Status codes are decided here; the HTML
/// bodies for 403/404/500 are rendered by the error-page middleware in
/// [`crate::app`], which has access to the templates.
use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// A looked-up user, group or post does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Anonymous access to a view that needs a user; `location` is the login URL
    #[error("Login required")]
    LoginRequired { location: String },

    #[error("CSRF verification failed: {0}")]
    CsrfFailure(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Media storage error: {0}")]
    Media(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::LoginRequired { .. } => StatusCode::FOUND,
            AppError::CsrfFailure(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_)
            | AppError::Template(_)
            | AppError::Media(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::LoginRequired { location } => HttpResponse::Found()
                .insert_header((header::LOCATION, location.as_str()))
                .finish(),
            AppError::NotFound(what) => {
                tracing::debug!(target = %what, "Resource not found");
                HttpResponse::NotFound()
                    .content_type("text/plain; charset=utf-8")
                    .body(self.to_string())
            }
            AppError::CsrfFailure(reason) => {
                tracing::warn!(reason = %reason, "Rejected request without a valid CSRF token");
                HttpResponse::Forbidden()
                    .content_type("text/plain; charset=utf-8")
                    .body(self.to_string())
            }
            AppError::BadRequest(_) => HttpResponse::BadRequest()
                .content_type("text/plain; charset=utf-8")
                .body(self.to_string()),
            _ => {
                tracing::error!(error = %self, "Request failed");
                HttpResponse::InternalServerError()
                    .content_type("text/plain; charset=utf-8")
                    .body("Internal server error")
            }
        }
    }
}
