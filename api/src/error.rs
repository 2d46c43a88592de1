//! Error types for the API.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::ProviderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// API error types following RFC 7807 Problem Details.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400) - body is not the expected JSON shape
    BadRequest(String),

    /// Validation error (400) - specific field validation failed
    ValidationError {
        /// The field that failed validation
        field: String,
        /// The validation error message
        message: String,
        /// Optional request ID for tracking
        request_id: Option<String>,
    },

    /// Payload too large (413) - body exceeds the extractor's limit
    PayloadTooLarge(String),

    /// Unsupported media type (415) - body is not declared as JSON
    UnsupportedMediaType(String),

    /// Internal server error (500) - the prediction pipeline failed
    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            Self::ValidationError { field, message, .. } => {
                write!(f, "Validation Error [field: {}]: {}", field, message)
            }
            Self::PayloadTooLarge(msg) => write!(f, "Payload Too Large: {}", msg),
            Self::UnsupportedMediaType(msg) => write!(f, "Unsupported Media Type: {}", msg),
            Self::InternalError(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// RFC 7807 Problem Details response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary
    pub title: String,

    /// HTTP status code
    pub status: u16,

    /// Human-readable explanation
    pub detail: String,

    /// Request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub request_id: Option<String>,

    /// Field-specific validation errors
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[schema(value_type = Option<Object>)]
    pub errors: Option<serde_json::Value>,
}

impl ApiError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::ValidationError { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (title, detail, request_id, errors) = match self {
            Self::BadRequest(msg) => ("Bad Request", msg, None, None),
            Self::ValidationError { field, message, request_id } => (
                "Validation Error",
                format!("Field '{}': {}", field, message),
                request_id,
                Some(serde_json::json!({ field: message })),
            ),
            Self::PayloadTooLarge(msg) => ("Payload Too Large", msg, None, None),
            Self::UnsupportedMediaType(msg) => ("Unsupported Media Type", msg, None, None),
            Self::InternalError(msg) => ("Internal Server Error", msg, None, None),
        };

        let problem = ProblemDetails {
            type_uri: format!("about:blank#{}", title.to_lowercase().replace(' ', "-")),
            title: title.to_string(),
            status: status.as_u16(),
            detail,
            request_id,
            errors,
        };

        (status, Json(problem)).into_response()
    }
}

/// Every backend failure is fatal to the request; nothing is partially returned.
impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

/// Body-level rejections keep their status; any other JSON problem is a 400.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(message),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => ApiError::UnsupportedMediaType(message),
            _ => ApiError::BadRequest(message),
        }
    }
}
