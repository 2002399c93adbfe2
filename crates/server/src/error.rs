//! API error types.

use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Challenge sent with every 401.
pub const BASIC_CHALLENGE: &str = r#"Basic realm="aumeta""#;

/// Body message shared by every credential rejection.
const UNAUTHORIZED_MESSAGE: &str = "authentication required";

/// Body message for failures whose detail stays in the server log.
const INTERNAL_MESSAGE: &str = "internal server error";

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("malformed credentials")]
    MalformedCredentials,

    #[error("bad credentials")]
    BadCredentials,

    #[error("forbidden: {0}")]
    InsufficientRole(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("metadata error: {0}")]
    Metadata(#[from] aumeta_metadata::MetadataError),

    #[error("core error: {0}")]
    Core(#[from] aumeta_core::Error),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredentials | Self::MalformedCredentials | Self::BadCredentials => {
                "unauthorized"
            }
            Self::InsufficientRole(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Conflict(_) => "conflict",
            Self::Unavailable(_) => "unavailable",
            Self::Internal(_) => "internal_error",
            Self::Metadata(e) => match e {
                aumeta_metadata::MetadataError::NotFound(_) => "not_found",
                aumeta_metadata::MetadataError::InvalidInput(_) => "bad_request",
                _ => "internal_error",
            },
            Self::Core(_) => "bad_request",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCredentials | Self::MalformedCredentials | Self::BadCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Self::InsufficientRole(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Metadata(e) => match e {
                aumeta_metadata::MetadataError::NotFound(_) => StatusCode::NOT_FOUND,
                aumeta_metadata::MetadataError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Core(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Metric label for credential rejections, `None` for every other error.
    pub fn auth_failure_reason(&self) -> Option<&'static str> {
        match self {
            Self::MissingCredentials => Some("missing_credentials"),
            Self::MalformedCredentials => Some("malformed_credentials"),
            Self::BadCredentials => Some("bad_credentials"),
            _ => None,
        }
    }

    /// Message rendered to the client.
    fn public_message(&self) -> String {
        if self.auth_failure_reason().is_some() {
            return UNAUTHORIZED_MESSAGE.to_string();
        }
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => INTERNAL_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.public_message(),
        };
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(BASIC_CHALLENGE));
        }
        response
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(format!("invalid query string: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(format!("invalid path: {}", rejection.body_text()))
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
