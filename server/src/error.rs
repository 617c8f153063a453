use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use host_agent_tools::{BackupError, FileRetrievalError, SearchError};
use host_agent_types::{ErrorBody, RequestError};
use thiserror::Error;

/// Every way a request can fail, mapped onto an HTTP status and an [`ErrorBody`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid authentication token")]
    Unauthorized,
    #[error("Invalid request body: {0}")]
    Body(String),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Files(#[from] FileRetrievalError),
    #[error("Backup operation failed: {0}")]
    Backup(#[from] BackupError),
    #[error("Internal server error")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection.body_text())
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Body(_) | Self::Request(_) => StatusCode::BAD_REQUEST,
            Self::Search(SearchError::DirectoryNotFound { .. })
            | Self::Files(FileRetrievalError::DirectoryNotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Search(SearchError::TimedOut { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Search(_) | Self::Backup(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(cause) => tracing::error!(%cause, "Request failed"),
            other if status.is_server_error() => tracing::error!(error = %other, "Request failed"),
            other => tracing::warn!(status = status.as_u16(), error = %other, "Request rejected"),
        }

        let body = ErrorBody {
            detail: self.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::Unauthorized) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
