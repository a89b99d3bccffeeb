use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::warn;

use crate::{
    error::{ApiError, guard_panics},
    generation::{GenerationRequest, GenerationResponse, new_task_id, run_pipeline},
    server::AppState,
};

/// POST /api/huggingface-proxy
///
/// Validates the body before any upstream call, then runs the two-stage
/// pipeline under a fresh task id. A panic in the pipeline still answers
/// with that task id.
pub async fn generate_video_proxy(
    State(state): State<AppState>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let params = request.validate().inspect_err(|err| {
        warn!(error_code = err.error_code(), "generation request rejected");
    })?;
    let task_id = new_task_id();
    let response =
        guard_panics(&task_id, run_pipeline(&state.client, &params, &task_id)).await?;
    Ok(Json(response))
}
