use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::{error::json_error, generation::parse_seconds};

pub const DEMO_STYLE: &str = "realistic";
pub const DEMO_DURATION: u32 = 8;
pub const SAMPLE_VIDEO_URL: &str =
    "https://sample-videos.com/zip/10/mp4/SampleVideo_1280x720_1mb.mp4";

/// Demo body. Fields of an unexpected shape fall back to their defaults
/// rather than failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct DemoRequest {
    #[serde(default, deserialize_with = "loose_text")]
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub style: Option<String>,
    #[serde(default, deserialize_with = "loose_seconds")]
    pub duration: Option<u32>,
}

fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    })
}

fn loose_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(parse_seconds(&Value::deserialize(deserializer)?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoResponse {
    pub success: bool,
    pub task_id: String,
    pub message: String,
    pub demo: bool,
    pub image_url: String,
    pub video_url: String,
}

/// Canned response for front-end work; never calls an upstream model.
pub async fn generate_video_demo(body: Result<Json<DemoRequest>, JsonRejection>) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("demo request rejected: {}", rejection.body_text());
            return json_error(StatusCode::BAD_REQUEST, "prompt required");
        }
    };
    let prompt = match request.prompt.filter(|prompt| !prompt.trim().is_empty()) {
        Some(prompt) => prompt,
        None => return json_error(StatusCode::BAD_REQUEST, "prompt required"),
    };
    let style = request.style.unwrap_or_else(|| DEMO_STYLE.to_string());
    let duration = request.duration.unwrap_or(DEMO_DURATION);
    let now = Utc::now().timestamp_millis();

    let task_id = format!("demo-{now}");

    info!(%task_id, "demo generation");
    let response = DemoResponse {
        success: true,
        task_id,
        message: format!("Demo mode: {prompt}, style: {style}, duration: {duration}s"),
        demo: true,
        image_url: format!("https://picsum.photos/1024/768?random={now}"),
        video_url: SAMPLE_VIDEO_URL.to_string(),
    };
    (StatusCode::OK, Json(response)).into_response()
}
