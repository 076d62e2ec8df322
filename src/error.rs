use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// ApiError
///
/// The full error taxonomy of the API. Every failure a handler, the auth
/// extractor, or the repository can produce is one of these variants; the
/// `IntoResponse` impl maps each to its status code and JSON body so no raw
/// storage error ever reaches a client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or out-of-range input, rejected before any storage mutation.
    #[error("Validation error")]
    Validation(Vec<String>),

    #[error("User with this email already exists")]
    DuplicateEmail,

    #[error("Student ID already exists")]
    DuplicateStudentId,

    #[error("Course code already exists")]
    DuplicateCourseCode,

    #[error("Already enrolled in this course")]
    AlreadyEnrolled,

    #[error("Already submitted for this assignment")]
    AlreadySubmitted,

    /// Identical message for unknown email and wrong password so the login
    /// endpoint cannot be used to enumerate accounts.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is deactivated. Please contact administrator.")]
    AccountDeactivated,

    /// Missing, malformed, expired, or otherwise unverifiable bearer token,
    /// or a token whose subject no longer resolves to an active user.
    #[error("Invalid or expired token")]
    Unauthenticated,

    #[error("Insufficient permissions")]
    Forbidden,

    /// Role check passed but the acting teacher does not own the course.
    #[error("You do not own this course")]
    NotOwner,

    #[error("Only students can enroll in courses")]
    OnlyStudentsMayEnroll,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Current password is incorrect")]
    IncorrectCurrentPassword,

    /// Storage fault: pool timeout, connection loss, or an unexpected query
    /// error. Logged server-side, reported to the client as a generic 500.
    #[error("storage unavailable: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// ErrorBody
///
/// Wire shape of every error response. `errors` is present only for
/// validation failures.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::DuplicateEmail
            | ApiError::DuplicateStudentId
            | ApiError::DuplicateCourseCode
            | ApiError::AlreadyEnrolled
            | ApiError::AlreadySubmitted
            | ApiError::IncorrectCurrentPassword => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials
            | ApiError::AccountDeactivated
            | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden | ApiError::NotOwner | ApiError::OnlyStudentsMayEnroll => {
                StatusCode::FORBIDDEN
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::Validation(errors) => ErrorBody {
                message: "Validation error".to_string(),
                errors: Some(errors.clone()),
            },
            // 500-class detail stays in the server log only.
            ApiError::Storage(e) => {
                tracing::error!("storage error: {:?}", e);
                ErrorBody {
                    message: "Internal server error".to_string(),
                    errors: None,
                }
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                ErrorBody {
                    message: "Internal server error".to_string(),
                    errors: None,
                }
            }
            other => ErrorBody {
                message: other.to_string(),
                errors: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
