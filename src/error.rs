use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Longest upstream body excerpt carried in an error.
pub const UPSTREAM_BODY_EXCERPT: usize = 200;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { field: String, message: String },
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

/// Failure talking to the FMP provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("FMP API error: {status} {body}")]
    Status { status: u16, body: String },
    #[error("FMP API request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("FMP API request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("FMP API returned an unexpected payload: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl AppError {
    pub fn validation<F: Into<String>, T: Into<String>>(field: F, message: T) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found<T: Into<String>>(message: T) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl UpstreamError {
    /// Builds a status error, keeping at most [`UPSTREAM_BODY_EXCERPT`] characters of the body.
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: body.chars().take(UPSTREAM_BODY_EXCERPT).collect(),
        }
    }

    /// Whether a caller may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Timeout(_) => true,
            UpstreamError::Status { status, .. } => *status == 429 || *status >= 500,
            UpstreamError::Transport(err) => err.is_connect(),
            UpstreamError::Decode(_) => false,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Status { .. } => "status",
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Transport(_) => "transport",
            UpstreamError::Decode(_) => "decode",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let AppError::Internal(err) = &self {
            tracing::error!(error = ?err, "request failed");
        }

        let field = match &self {
            AppError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };

        let body = ErrorBody {
            detail: self.to_string(),
            field,
        };

        (status, Json(body)).into_response()
    }
}
