use std::{any::Any, future::Future, panic::AssertUnwindSafe};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use futures::FutureExt;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub const MODEL_LOADING_RETRY_SECS: u64 = 60;
pub const TOKEN_HELP_URL: &str = "https://huggingface.co/settings/tokens";
const UPSTREAM_EXCERPT_CHARS: usize = 200;

/// Failures of the generation endpoint. Each variant maps to one HTTP status
/// and one `error_code`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("a prompt is required for video generation")]
    MissingPrompt,

    #[error("HuggingFace token is invalid, it must start with hf_")]
    InvalidToken,

    #[error("HuggingFace token is invalid or lacks permission")]
    Unauthorized,

    #[error("access to the model was denied: {0}")]
    AccessDenied(String),

    #[error("the model is still loading, retry in 30-60 seconds")]
    ModelLoading { task_id: String },

    #[error("image generation failed: {0}")]
    ImageGenerationFailed(String),

    #[error("internal server error: {message}")]
    Server {
        message: String,
        task_id: Option<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error_code: &'static str,
    pub error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_url: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ApiError {
    pub fn server(message: impl Into<String>, task_id: Option<&str>) -> Self {
        ApiError::Server {
            message: message.into(),
            task_id: task_id.map(str::to_string),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::MissingPrompt | ApiError::InvalidToken => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::AccessDenied(_) => StatusCode::FORBIDDEN,
            ApiError::ModelLoading { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ImageGenerationFailed(_) | ApiError::Server { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::MissingPrompt => "MISSING_PROMPT",
            ApiError::InvalidToken | ApiError::Unauthorized => "INVALID_TOKEN",
            ApiError::AccessDenied(_) => "ACCESS_DENIED",
            ApiError::ModelLoading { .. } => "MODEL_LOADING",
            ApiError::ImageGenerationFailed(_) => "IMAGE_GENERATION_FAILED",
            ApiError::Server { .. } => "SERVER_ERROR",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let mut body = ErrorBody {
            success: false,
            error_code: self.error_code(),
            error_message: self.to_string(),
            retry_after_seconds: None,
            task_id: None,
            help_url: None,
            timestamp: None,
        };
        match self {
            ApiError::ModelLoading { task_id } => {
                body.retry_after_seconds = Some(MODEL_LOADING_RETRY_SECS);
                body.task_id = Some(task_id.clone());
            }
            ApiError::Unauthorized | ApiError::AccessDenied(_) => {
                body.help_url = Some(TOKEN_HELP_URL);
            }
            ApiError::Server { task_id, .. } => {
                body.task_id = task_id.clone();
                body.timestamp = Some(now_rfc3339());
            }
            _ => {}
        }
        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}

/// Maps a failed text-to-image call onto the error returned to the caller.
///
/// Matching is on the upstream body text, checked in order: model loading,
/// authorization, forbidden, then a generic failure carrying an excerpt.
pub fn classify_image_failure(status: StatusCode, text: &str, task_id: &str) -> ApiError {
    let lower = text.to_lowercase();
    if lower.contains("loading") {
        return ApiError::ModelLoading {
            task_id: task_id.to_string(),
        };
    }
    if lower.contains("authorization") || lower.contains("unauthorized") {
        return ApiError::Unauthorized;
    }
    if status == StatusCode::FORBIDDEN || lower.contains("forbidden") {
        return ApiError::AccessDenied(excerpt(text));
    }
    ApiError::ImageGenerationFailed(excerpt(text))
}

fn excerpt(text: &str) -> String {
    text.chars().take(UPSTREAM_EXCERPT_CHARS).collect()
}

#[derive(Serialize)]
struct SimpleErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    method_received: Option<String>,
}

/// `{success:false, error}` body used by the demo endpoint and the CORS shim.
pub fn json_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(SimpleErrorBody {
            success: false,
            error: message.to_string(),
            method_received: None,
        }),
    )
        .into_response()
}

pub fn method_not_allowed(method: &str) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(SimpleErrorBody {
            success: false,
            error: "method not allowed".to_string(),
            method_received: Some(method.to_string()),
        }),
    )
        .into_response()
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else {
        "handler panicked".to_string()
    }
}

/// Runs `work` and turns a panic inside it into `SERVER_ERROR` for `task_id`.
pub async fn guard_panics<T, F>(task_id: &str, work: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(task_id, %message, "generation panicked");
            Err(ApiError::server(message, Some(task_id)))
        }
    }
}
