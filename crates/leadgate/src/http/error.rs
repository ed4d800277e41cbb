//! Mapping of domain and request errors onto HTTP responses.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use leadgate_core::{AccessDenied, AuthFailure, Error};
use serde::Serialize;
use tracing::error;

const INTERNAL: &str = "An unexpected error occurred";

/// One failing field in a 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Request field name.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    errors: Vec<FieldError>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// 400 with a plain message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 with the message for `failure`.
    #[must_use]
    pub fn unauthorized(failure: AuthFailure) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, failure.message())
    }

    /// 403 with the message for `denied`.
    #[must_use]
    pub fn forbidden(denied: AccessDenied) -> Self {
        Self::new(StatusCode::FORBIDDEN, denied.message())
    }

    fn internal(cause: &dyn std::fmt::Display) -> Self {
        error!(error = %cause, "Request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL)
    }

    /// Response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.message,
            errors: self.errors,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(errors) => Self {
                status: StatusCode::BAD_REQUEST,
                message: "One or more validation errors occurred".to_string(),
                errors: errors
                    .iter()
                    .map(|e| FieldError {
                        field: e.field(),
                        message: e.message(),
                    })
                    .collect(),
            },
            Error::Conflict(message) => Self::new(StatusCode::CONFLICT, message),
            Error::LeadNotFound(_) => Self::new(StatusCode::NOT_FOUND, "Lead not found"),
            Error::AccountNotFound(_) => Self::new(StatusCode::NOT_FOUND, "User not found"),
            Error::Unauthorized(failure) => Self::unauthorized(failure),
            Error::Forbidden(denied) => Self::forbidden(denied),
            other @ (Error::Database(_) | Error::PasswordHash(_) | Error::Corrupt(_)) => {
                Self::internal(&other)
            }
        }
    }
}

impl From<leadgate_auth::Error> for ApiError {
    fn from(err: leadgate_auth::Error) -> Self {
        match err {
            leadgate_auth::Error::Expired | leadgate_auth::Error::Invalid(_) => {
                Self::unauthorized(AuthFailure::InvalidToken)
            }
            other @ (leadgate_auth::Error::Signing(_) | leadgate_auth::Error::InvalidConfig(_)) => {
                Self::internal(&other)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, rejection.body_text())
            }
            other => Self::bad_request(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}
