use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::server::AppState;

pub async fn openapi_json(State(state): State<AppState>) -> Json<Value> {
    Json(openapi_document(&state.config.public_base_url))
}

/// Static description of `POST /api/generate-video`, with `server_url` listed
/// first among the servers.
pub fn openapi_document(server_url: &str) -> Value {
    json!({
        "openapi": "3.0.0",
        "info": {
            "title": "AI image-to-video generator",
            "description": "Generates an image from a prompt and extends it into a 5-10 second video",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "servers": [
            { "url": server_url, "description": "Configured server" },
            { "url": "http://localhost:3000", "description": "Development server" },
        ],
        "paths": {
            "/api/generate-video": {
                "post": {
                    "summary": "Generate an image and turn it into a video",
                    "description": "Generates an image from the prompt, then a 5-10 second video based on that image",
                    "operationId": "generateImageToVideo",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "required": ["prompt"],
                                    "properties": {
                                        "prompt": {
                                            "type": "string",
                                            "description": "Image prompt; may name a style, subject, place and action",
                                            "example": "A cute kitten playing in a sunny garden, cartoon style, bright colors",
                                        },
                                        "style": {
                                            "type": "string",
                                            "description": "Preferred image style",
                                            "enum": ["realistic", "cartoon", "anime", "artistic", "cinematic"],
                                            "default": "realistic",
                                        },
                                        "duration": {
                                            "type": "integer",
                                            "description": "Video length in seconds",
                                            "minimum": 5,
                                            "maximum": 10,
                                            "default": 8,
                                        },
                                        "resolution": {
                                            "type": "string",
                                            "description": "Video resolution",
                                            "enum": ["720p", "1080p"],
                                            "default": "1080p",
                                        },
                                    },
                                },
                            },
                        },
                    },
                    "responses": {
                        "200": {
                            "description": "Task created",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "success": { "type": "boolean" },
                                            "taskId": { "type": "string" },
                                            "status": { "type": "string" },
                                            "message": { "type": "string" },
                                            "demo": { "type": "boolean" },
                                            "imageUrl": { "type": "string" },
                                            "videoUrl": { "type": "string" },
                                        },
                                    },
                                },
                            },
                        },
                        "400": {
                            "description": "Invalid request parameters",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "success": { "type": "boolean" },
                                            "error": { "type": "string" },
                                        },
                                    },
                                },
                            },
                        },
                    },
                },
            },
        },
    })
}
