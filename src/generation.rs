//! Two-stage prompt-to-video pipeline: text-to-image, then best-effort
//! image-to-video with the image standing in when the second stage fails.

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::{
    error::{ApiError, classify_image_failure, now_rfc3339},
    huggingface::{
        GenerateImageOptions, GenerateVideoOptions, HuggingFaceClient, MAX_VIDEO_FRAMES,
        UpstreamError, VIDEO_FPS,
    },
    media::{self, DataUrl, VIDEO_MIME_TYPE},
};

pub const TOKEN_PREFIX: &str = "hf_";
pub const NEGATIVE_PROMPT: &str = "low quality, blurry, distorted, bad anatomy, watermark, text";
const PROMPT_QUALIFIERS: &str = "detailed, cinematic lighting";

pub const DEFAULT_STYLE: &str = "realistic photography";
pub const DEFAULT_DURATION: u32 = 5;
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";
pub const DEFAULT_MOTION_INTENSITY: &str = "medium";
pub const DEFAULT_QUALITY: &str = "high definition";
pub const MAX_DURATION: u32 = 10;

const DEFAULT_DIMENSIONS: (u32, u32) = (1024, 576);
const DOWNLOAD_EXPIRY_HOURS: i64 = 24;
const TOKEN_PREVIEW_CHARS: usize = 8;

// Placeholder quota block; there is no real accounting behind these.
const REMAINING_QUOTA: u32 = 998;
const QUOTA_RESET_DATE: &str = "2025-01-01";

/// Raw proxy body. Every field is kept as loose JSON so that a mistyped
/// optional field cannot mask a missing prompt or a bad token.
#[derive(Debug, Default, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub prompt: Option<Value>,
    #[serde(default)]
    pub huggingface_token: Option<Value>,
    #[serde(default)]
    pub style: Option<Value>,
    #[serde(default)]
    pub duration: Option<Value>,
    #[serde(default)]
    pub aspect_ratio: Option<Value>,
    #[serde(default)]
    pub motion_intensity: Option<Value>,
    #[serde(default)]
    pub quality: Option<Value>,
}

/// A request that passed validation, with every default filled in.
#[derive(Clone, Debug)]
pub struct GenerationParams {
    pub prompt: String,
    pub token: String,
    pub style: String,
    pub duration: u32,
    pub aspect_ratio: String,
    pub motion_intensity: String,
    pub quality: String,
}

impl GenerationRequest {
    /// Checks the prompt, then the token, then the shape and bounds of the
    /// optional fields.
    pub fn validate(self) -> Result<GenerationParams, ApiError> {
        let prompt = match self.prompt {
            Some(Value::String(prompt)) if !prompt.trim().is_empty() => prompt,
            _ => return Err(ApiError::MissingPrompt),
        };
        let token = match self.huggingface_token {
            Some(Value::String(token)) if token.starts_with(TOKEN_PREFIX) => token,
            _ => return Err(ApiError::InvalidToken),
        };
        let duration = match self.duration {
            None | Some(Value::Null) => DEFAULT_DURATION,
            Some(value) => parse_seconds(&value).ok_or_else(|| {
                ApiError::BadRequest(format!("duration must be a number of seconds, got {value}"))
            })?,
        };
        if duration == 0 || duration > MAX_DURATION {
            return Err(ApiError::BadRequest(format!(
                "duration must be between 1 and {MAX_DURATION} seconds, got {duration}"
            )));
        }
        Ok(GenerationParams {
            prompt,
            token,
            style: text_field("style", self.style, DEFAULT_STYLE)?,
            duration,
            aspect_ratio: text_field("aspect_ratio", self.aspect_ratio, DEFAULT_ASPECT_RATIO)?,
            motion_intensity: text_field(
                "motion_intensity",
                self.motion_intensity,
                DEFAULT_MOTION_INTENSITY,
            )?,
            quality: text_field("quality", self.quality, DEFAULT_QUALITY)?,
        })
    }
}

fn text_field(name: &str, value: Option<Value>, default: &str) -> Result<String, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(Value::String(text)) => Ok(text),
        Some(other) => Err(ApiError::BadRequest(format!(
            "{name} must be a string, got {other}"
        ))),
    }
}

/// Whole seconds from a JSON number or numeric string; fractions round.
pub fn parse_seconds(value: &Value) -> Option<u32> {
    let seconds = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !seconds.is_finite() || seconds < 0.0 || seconds > f64::from(u32::MAX) {
        return None;
    }
    Some(seconds.round() as u32)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    Completed,
    ImageOnly,
}

pub fn enhance_prompt(prompt: &str, style: &str, quality: &str) -> String {
    format!("{prompt}, {style}, {quality}, {PROMPT_QUALIFIERS}")
}

/// Width and height for an aspect ratio; unknown ratios get 16:9.
pub fn resolve_dimensions(aspect_ratio: &str) -> (u32, u32) {
    match aspect_ratio.trim() {
        "16:9" => (1024, 576),
        "9:16" => (576, 1024),
        "1:1" => (768, 768),
        _ => DEFAULT_DIMENSIONS,
    }
}

pub fn motion_bucket_id(motion_intensity: &str) -> u32 {
    match motion_intensity.trim().to_lowercase().as_str() {
        "low" | "轻微" => 50,
        "high" | "强烈" => 200,
        _ => 127,
    }
}

pub fn frame_count(duration: u32) -> u32 {
    duration.saturating_mul(VIDEO_FPS).min(MAX_VIDEO_FRAMES)
}

pub fn token_preview(token: &str) -> String {
    let head: String = token.chars().take(TOKEN_PREVIEW_CHARS).collect();
    format!("{head}...")
}

/// `ai_video_<unix ms>_<9 base36 chars>`
pub fn new_task_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .filter_map(|_| std::char::from_digit(rng.gen_range(0..36), 36))
        .collect();
    format!("ai_video_{}_{suffix}", Utc::now().timestamp_millis())
}

fn round_seconds(millis: u128) -> f64 {
    (millis as f64 / 1000.0 * 10.0).round() / 10.0
}

fn model_label(endpoint: &str) -> String {
    endpoint
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(endpoint)
        .to_string()
}

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub success: bool,
    pub task_id: String,
    pub generation_status: VideoStatus,
    pub original_prompt: String,
    pub enhanced_prompt: String,
    pub generated_image: GeneratedImage,
    pub generated_video: GeneratedVideo,
    pub generation_metadata: GenerationMetadata,
    pub download_info: DownloadInfo,
    pub json: DebugEcho,
}

#[derive(Debug, Serialize)]
pub struct GeneratedImage {
    pub url: String,
    pub thumbnail: String,
    pub resolution: String,
    pub format: String,
    pub base64_size_kb: u64,
}

#[derive(Debug, Serialize)]
pub struct GeneratedVideo {
    pub url: String,
    pub preview_gif: String,
    pub duration_seconds: u32,
    pub frame_rate: u32,
    pub resolution: String,
    pub file_size_mb: f64,
    pub status: VideoStatus,
}

#[derive(Debug, Serialize)]
pub struct GenerationMetadata {
    pub model_versions: ModelVersions,
    pub processing_time: ProcessingTime,
    pub token_usage: TokenUsage,
}

#[derive(Debug, Serialize)]
pub struct ModelVersions {
    pub image_model: String,
    pub video_model: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessingTime {
    pub image_generation_seconds: f64,
    pub video_generation_seconds: f64,
    pub total_seconds: f64,
}

#[derive(Debug, Serialize)]
pub struct TokenUsage {
    pub tokens_used: u32,
    pub remaining_quota: u32,
    pub reset_date: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadInfo {
    pub expiry_time: String,
    pub download_tips: Vec<String>,
}

/// Echo of the request for debugging. Only a preview of the token is kept.
#[derive(Debug, Serialize)]
pub struct DebugEcho {
    pub prompt: String,
    pub style: String,
    pub duration: u32,
    pub quality: String,
    pub token_preview: String,
    pub aspect_ratio: String,
    pub image_size_kb: u64,
    pub generation_timestamp: String,
}

fn download_tips(status: VideoStatus) -> Vec<String> {
    let completed = status == VideoStatus::Completed;
    vec![
        if completed {
            "Image and video were both generated successfully"
        } else {
            "Video generation did not finish, a high quality image was generated"
        }
        .to_string(),
        "The image can be viewed and downloaded directly".to_string(),
        if completed {
            "The video plays in all mainstream players"
        } else {
            "The video may need more time or a new generation request"
        }
        .to_string(),
        "Save the results soon, links are valid for 24 hours".to_string(),
    ]
}

/// Runs both stages for one validated request.
///
/// Stage A failures end the request. Stage B failures are logged and the
/// image data URL is reused as the video.
pub async fn run_pipeline(
    client: &HuggingFaceClient,
    params: &GenerationParams,
    task_id: &str,
) -> Result<GenerationResponse, ApiError> {
    let preview = token_preview(&params.token);
    info!(task_id, style = %params.style, token = %preview, "generation started");

    let enhanced_prompt = enhance_prompt(&params.prompt, &params.style, &params.quality);
    let (width, height) = resolve_dimensions(&params.aspect_ratio);
    let resolution = format!("{width}x{height}");

    let started = Instant::now();
    let image_bytes = client
        .generate_image(
            &GenerateImageOptions {
                prompt: &enhanced_prompt,
                negative_prompt: NEGATIVE_PROMPT,
                width,
                height,
            },
            &params.token,
        )
        .await
        .map_err(|err| match err {
            UpstreamError::Status { status, text } => {
                warn!(task_id, %status, "image generation failed");
                classify_image_failure(status, &text, task_id)
            }
            UpstreamError::Transport(err) => {
                warn!(task_id, error = %err, "image request error");
                ApiError::server(err.to_string(), Some(task_id))
            }
        })?;

    let (image_mime, image_format) = media::detect_image_format(&image_bytes);
    let image = DataUrl::encode(image_mime, &image_bytes);
    let image_millis = started.elapsed().as_millis();
    info!(task_id, elapsed_ms = image_millis as u64, "image generated");

    let video_started = Instant::now();
    let video_options = GenerateVideoOptions {
        image_data_url: &image.url,
        num_frames: frame_count(params.duration),
        motion_bucket_id: motion_bucket_id(&params.motion_intensity),
    };
    let (video_url, video_status, video_millis) =
        match client.generate_video(&video_options, &params.token).await {
            Ok(bytes) => {
                let millis = video_started.elapsed().as_millis();
                info!(task_id, elapsed_ms = millis as u64, "video generated");
                (
                    DataUrl::encode(VIDEO_MIME_TYPE, &bytes).url,
                    VideoStatus::Completed,
                    millis,
                )
            }
            Err(UpstreamError::Status { status, text }) => {
                let excerpt: String = text.chars().take(100).collect();
                warn!(task_id, %status, upstream = %excerpt, "video generation failed, returning image only");
                (image.url.clone(), VideoStatus::ImageOnly, 0)
            }
            Err(err) => {
                warn!(task_id, error = %err, "video request error, returning image only");
                (image.url.clone(), VideoStatus::ImageOnly, 0)
            }
        };

    let total_millis = started.elapsed().as_millis();
    let completed = video_status == VideoStatus::Completed;
    let image_size_kb = media::base64_size_kb(image.base64_len);
    let file_size_mb = if completed {
        media::base64_size_mb(video_url.len())
    } else {
        0.0
    };

    info!(
        task_id,
        status = ?video_status,
        image_ms = image_millis as u64,
        video_ms = video_millis as u64,
        total_ms = total_millis as u64,
        "generation finished"
    );

    let now = Utc::now();
    Ok(GenerationResponse {
        success: true,
        task_id: task_id.to_string(),
        generation_status: video_status,
        original_prompt: params.prompt.clone(),
        enhanced_prompt,
        generated_image: GeneratedImage {
            url: image.url.clone(),
            thumbnail: image.url.clone(),
            resolution: resolution.clone(),
            format: image_format.to_string(),
            base64_size_kb: image_size_kb,
        },
        generated_video: GeneratedVideo {
            url: video_url,
            preview_gif: image.url.clone(),
            duration_seconds: params.duration,
            frame_rate: VIDEO_FPS,
            resolution,
            file_size_mb,
            status: video_status,
        },
        generation_metadata: GenerationMetadata {
            model_versions: ModelVersions {
                image_model: model_label(client.image_endpoint()),
                video_model: model_label(client.video_endpoint()),
            },
            processing_time: ProcessingTime {
                image_generation_seconds: round_seconds(image_millis),
                video_generation_seconds: round_seconds(video_millis),
                total_seconds: round_seconds(total_millis),
            },
            token_usage: TokenUsage {
                tokens_used: if completed { 2 } else { 1 },
                remaining_quota: REMAINING_QUOTA,
                reset_date: QUOTA_RESET_DATE.to_string(),
            },
        },
        download_info: DownloadInfo {
            expiry_time: (now + ChronoDuration::hours(DOWNLOAD_EXPIRY_HOURS))
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            download_tips: download_tips(video_status),
        },
        json: DebugEcho {
            prompt: params.prompt.clone(),
            style: params.style.clone(),
            duration: params.duration,
            quality: params.quality.clone(),
            token_preview: preview,
            aspect_ratio: params.aspect_ratio.clone(),
            image_size_kb,
            generation_timestamp: now_rfc3339(),
        },
    })
}
