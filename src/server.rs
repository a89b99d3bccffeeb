use std::{any::Any, sync::Arc};

use axum::{
    Router,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{any, post},
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::error;

use crate::{
    config::AppConfig,
    cors::{DEMO_POLICY, DOCUMENT_POLICY, INDEX_POLICY, PROXY_POLICY, cors_shim},
    error::{ApiError, panic_message},
    handlers,
    huggingface::HuggingFaceClient,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: HuggingFaceClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let client = HuggingFaceClient::new(
            config.image_endpoint.clone(),
            config.video_endpoint.clone(),
        );
        Self {
            config: Arc::new(config),
            client,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api",
            any(handlers::api_index).layer(from_fn_with_state(INDEX_POLICY, cors_shim)),
        )
        .route(
            "/api/generate-video",
            post(handlers::generate_video_demo).layer(from_fn_with_state(DEMO_POLICY, cors_shim)),
        )
        .route(
            "/api/huggingface-proxy",
            post(handlers::generate_video_proxy)
                .layer(from_fn_with_state(PROXY_POLICY, cors_shim)),
        )
        .route(
            "/openapi.json",
            any(handlers::openapi_json).layer(from_fn_with_state(DOCUMENT_POLICY, cors_shim)),
        )
        .route(
            "/health",
            any(handlers::health).layer(from_fn_with_state(DOCUMENT_POLICY, cors_shim)),
        )
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload.as_ref());
    error!(%message, "handler panicked");
    ApiError::server(message, None).into_response()
}
