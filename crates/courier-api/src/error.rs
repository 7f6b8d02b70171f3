use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use courier_types::error::Error;
use serde_json::json;
use thiserror::Error as ThisError;
use tracing::{debug, error};

/// Everything a handler can fail with. This is the only place error kinds
/// are turned into HTTP statuses.
#[derive(ThisError, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] Error),

    /// Login with an unknown user or a wrong password. Deliberately one case.
    #[error("Invalid username/password")]
    BadCredentials,

    #[error("{0}")]
    BadRequest(String),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => match e {
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                Error::DuplicateIdentity(_) => StatusCode::CONFLICT,
                Error::ReferentialViolation(_) => StatusCode::BAD_REQUEST,
                Error::Forbidden => StatusCode::FORBIDDEN,
                Error::Unauthenticated => StatusCode::UNAUTHORIZED,
                Error::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadCredentials | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the caller. Server-side details stay in the log.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Core(e) => match e {
                Error::NotFound(msg) => msg.clone(),
                Error::DuplicateIdentity(username) => {
                    format!("Username already taken: {}", username)
                }
                Error::ReferentialViolation(_) => "No such user".to_string(),
                Error::Forbidden | Error::Unauthenticated => "Unauthorized".to_string(),
                Error::StoreUnavailable(_) => "Service unavailable".to_string(),
                Error::Internal(_) => "Internal server error".to_string(),
            },
            ApiError::BadCredentials | ApiError::BadRequest(_) => self.to_string(),
            ApiError::Task(_) => "Internal server error".to_string(),
        }
    }
}

// Malformed bodies and path segments go through the same table as every
// other failure instead of axum's plain-text rejections.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = %self, status = %status.as_u16(), "Request failed");
        } else {
            debug!(error = %self, status = %status.as_u16(), "Request rejected");
        }

        let body = json!({
            "error": {
                "status": status.as_u16(),
                "message": self.user_message(),
            }
        });

        (status, Json(body)).into_response()
    }
}
