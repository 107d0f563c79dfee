use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{Error, ErrorKind};

/// Result type returned by route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

const SUCCESS: &str = "success";
const ERROR: &str = "error";

/// Body returned by every write endpoint and by failed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Either `success` or `error`.
    pub status: String,

    /// Id assigned by a create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Why the request failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    /// Plain success body.
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: SUCCESS.to_string(),
            id: None,
            message: None,
        }
    }

    /// Success body carrying the new id.
    #[must_use]
    pub fn created(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::success()
        }
    }

    /// Failure body with a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ERROR.to_string(),
            id: None,
            message: Some(message.into()),
        }
    }

    /// Check the status field.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS
    }
}

/// A failed request, rendered as a JSON [`StatusResponse`].
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status sent back.
    pub status_code: StatusCode,
    /// Human-readable reason.
    pub message: String,
}

impl ApiError {
    /// Create an error with an explicit status.
    pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }

    /// Error for a path no route matches.
    #[must_use]
    pub fn not_found_route(method: &Method, uri: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("no route for {method} {uri}"))
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status_code = match err.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Storage | ErrorKind::Config | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status_code.is_server_error() {
            error!("Request failed: {err}");
        } else {
            debug!("Request rejected: {err}");
        }

        Self::new(status_code, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {rejection}");
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!("Rejected request path: {rejection}");
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code, Json(StatusResponse::error(self.message))).into_response()
    }
}
