// src/errors.rs
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid JSON body")]
    InvalidJson,

    #[error("{0}")]
    Validation(String),

    #[error("Invalid provider: {0}")]
    InvalidProvider(String),

    #[error("URL not allowed")]
    UrlNotAllowed,

    #[error("{header} is required for {provider}")]
    MissingAuth { header: String, provider: String },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Upstream answered but the answer is unusable (bad status, no image, quota).
    #[error("{0}")]
    Provider(String),

    /// Network-level failure or upstream 5xx; the only kind worth retrying.
    #[error("{0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Transport(format!("Upstream request timed out: {}", err))
        } else if err.is_decode() {
            ApiError::Provider(format!("Failed to parse upstream response: {}", err))
        } else {
            ApiError::Transport(format!("Upstream request failed: {}", err))
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson
            | ApiError::Validation(_)
            | ApiError::InvalidProvider(_)
            | ApiError::UrlNotAllowed => StatusCode::BAD_REQUEST,
            ApiError::MissingAuth { .. } => StatusCode::UNAUTHORIZED,
            ApiError::UnknownProvider(_)
            | ApiError::Provider(_)
            | ApiError::Transport(_)
            | ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}
