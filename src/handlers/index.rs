use axum::Json;
use serde_json::{Value, json};

pub const SERVICE_NAME: &str = "AI image-to-video generator API";

pub async fn api_index() -> Json<Value> {
    Json(json!({
        "message": SERVICE_NAME,
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "openapi": "/openapi.json",
            "generateVideo": "/api/generate-video",
            "huggingfaceProxy": "/api/huggingface-proxy",
            "health": "/health",
        }
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
