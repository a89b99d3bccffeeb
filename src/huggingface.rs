use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub const NUM_INFERENCE_STEPS: u32 = 25;
pub const GUIDANCE_SCALE: f32 = 7.5;
pub const VIDEO_FPS: u32 = 6;
pub const MAX_VIDEO_FRAMES: u32 = 25;
const NOISE_AUG_STRENGTH: f32 = 0.1;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HuggingFace request failed: {status} {text}")]
    Status { status: StatusCode, text: String },

    #[error("HuggingFace request error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a, P> {
    inputs: &'a str,
    parameters: P,
}

#[derive(Debug, Serialize)]
struct TextToImageParameters<'a> {
    negative_prompt: &'a str,
    num_inference_steps: u32,
    guidance_scale: f32,
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize)]
struct ImageToVideoParameters {
    num_frames: u32,
    motion_bucket_id: u32,
    fps: u32,
    noise_aug_strength: f32,
}

pub struct GenerateImageOptions<'a> {
    pub prompt: &'a str,
    pub negative_prompt: &'a str,
    pub width: u32,
    pub height: u32,
}

pub struct GenerateVideoOptions<'a> {
    pub image_data_url: &'a str,
    pub num_frames: u32,
    pub motion_bucket_id: u32,
}

/// Thin client over the two HuggingFace inference endpoints. Both return the
/// raw media bytes on success.
#[derive(Clone, Debug)]
pub struct HuggingFaceClient {
    http: Client,
    image_endpoint: String,
    video_endpoint: String,
}

async fn assert_ok_response(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status { status, text })
}

impl HuggingFaceClient {
    pub fn new(image_endpoint: impl Into<String>, video_endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            image_endpoint: image_endpoint.into(),
            video_endpoint: video_endpoint.into(),
        }
    }

    pub fn image_endpoint(&self) -> &str {
        &self.image_endpoint
    }

    pub fn video_endpoint(&self) -> &str {
        &self.video_endpoint
    }

    pub async fn generate_image(
        &self,
        options: &GenerateImageOptions<'_>,
        token: &str,
    ) -> Result<Vec<u8>, UpstreamError> {
        let body = InferenceRequest {
            inputs: options.prompt,
            parameters: TextToImageParameters {
                negative_prompt: options.negative_prompt,
                num_inference_steps: NUM_INFERENCE_STEPS,
                guidance_scale: GUIDANCE_SCALE,
                width: options.width,
                height: options.height,
            },
        };
        debug!(
            endpoint = %self.image_endpoint,
            width = options.width,
            height = options.height,
            "text-to-image request"
        );
        let response = self
            .http
            .post(&self.image_endpoint)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let response = assert_ok_response(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn generate_video(
        &self,
        options: &GenerateVideoOptions<'_>,
        token: &str,
    ) -> Result<Vec<u8>, UpstreamError> {
        let body = InferenceRequest {
            inputs: options.image_data_url,
            parameters: ImageToVideoParameters {
                num_frames: options.num_frames,
                motion_bucket_id: options.motion_bucket_id,
                fps: VIDEO_FPS,
                noise_aug_strength: NOISE_AUG_STRENGTH,
            },
        };
        debug!(
            endpoint = %self.video_endpoint,
            num_frames = options.num_frames,
            motion_bucket_id = options.motion_bucket_id,
            "image-to-video request"
        );
        let response = self
            .http
            .post(&self.video_endpoint)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let response = assert_ok_response(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
