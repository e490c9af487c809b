use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use scubaclub_dal::Error as DalError;
use serde_json::json;
use tracing::{debug, error};

use crate::mailer::MailError;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Unprocessable request: {0}")]
    UnprocessableRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    DatabaseError(#[source] DalError),
    #[error("Session error: {0}")]
    SessionError(#[from] tower_sessions::session::Error),
    #[error("Token error: {0}")]
    TokenError(#[from] scubaclub_auth::error::Error),
    #[error("Mail error: {0}")]
    MailError(#[from] MailError),
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<DalError> for ApiError {
    fn from(e: DalError) -> Self {
        match e {
            DalError::RecordNotFound(entity) => ApiError::ResourceNotFound(entity),
            DalError::InvalidCredentials => ApiError::Unauthorized,
            e @ (DalError::LastAdmin(_)
            | DalError::EventFull(_)
            | DalError::EventCancelled(_)
            | DalError::InvalidStatusTransition { .. }) => ApiError::Conflict(e.to_string()),
            e @ (DalError::NotAMember { .. } | DalError::InvalidValue(_)) => {
                ApiError::UnprocessableRequest(e.to_string())
            }
            other => ApiError::DatabaseError(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnprocessableRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::DatabaseError(_)
            | ApiError::SessionError(_)
            | ApiError::TokenError(_)
            | ApiError::MailError(_)
            | ApiError::UrlError(_)
            | ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("Request failed: {self}");
            "Internal server error".to_string()
        } else {
            debug!("Request rejected with {status}: {self}");
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
