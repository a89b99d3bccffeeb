//! Router-level tests: CORS shim, demo endpoint, index, OpenAPI document.

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;
use video_gen_proxy::{AppConfig, AppState, build_router};

fn app() -> Router {
    build_router(AppState::new(AppConfig::default()))
}

async fn send(method: Method, uri: &str, body: Option<Value>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, bytes.to_vec())
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn test_options_short_circuits_on_every_route() {
    for uri in [
        "/api",
        "/api/generate-video",
        "/api/huggingface-proxy",
        "/openapi.json",
        "/health",
    ] {
        let (status, headers, body) =
            send(Method::OPTIONS, uri, Some(json!({"prompt": "ignored"}))).await;
        assert_eq!(status, StatusCode::OK, "OPTIONS {uri}");
        assert!(body.is_empty(), "OPTIONS {uri} should have an empty body");
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert!(headers.contains_key("access-control-allow-methods"), "{uri}");
        assert!(headers.contains_key("access-control-allow-headers"), "{uri}");
    }
}

#[tokio::test]
async fn test_proxy_advertises_authorization_header() {
    let (_, headers, _) = send(Method::OPTIONS, "/api/huggingface-proxy", None).await;
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(
        headers["access-control-allow-headers"],
        "Content-Type, Authorization"
    );
}

#[tokio::test]
async fn test_disallowed_methods_return_405_json() {
    for uri in ["/api/generate-video", "/api/huggingface-proxy"] {
        let (status, headers, body) = send(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "GET {uri}");
        assert_eq!(headers["access-control-allow-origin"], "*");
        let body = json_body(&body);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
        assert_eq!(body["method_received"], "GET");
    }
}

#[tokio::test]
async fn test_demo_requires_prompt() {
    for payload in [json!({}), json!({"prompt": ""}), json!({"style": "anime"})] {
        let (status, _, body) = send(Method::POST, "/api/generate-video", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body = json_body(&body);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "prompt required");
    }

    let (status, _, _) = send(Method::POST, "/api/generate-video", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_demo_returns_canned_payload() {
    let (status, headers, body) = send(
        Method::POST,
        "/api/generate-video",
        Some(json!({"prompt": "a fox in the snow"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");

    let body = json_body(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["demo"], true);
    assert!(body["taskId"].as_str().unwrap().starts_with("demo-"));
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("a fox in the snow"));
    assert!(message.contains("realistic"));
    assert!(message.contains('8'));
    assert!(
        body["imageUrl"]
            .as_str()
            .unwrap()
            .starts_with("https://picsum.photos/1024/768?random=")
    );
    assert!(body["videoUrl"].as_str().unwrap().ends_with(".mp4"));
}

#[tokio::test]
async fn test_demo_tolerates_loosely_typed_fields() {
    let cases = [
        (json!({"prompt": "a fox", "duration": "8"}), "duration: 8s"),
        (json!({"prompt": "a fox", "duration": 5.5}), "duration: 6s"),
        (json!({"prompt": "a fox", "duration": "soon"}), "duration: 8s"),
        (json!({"prompt": "a fox", "style": 3}), "style: 3"),
    ];
    for (payload, expected) in cases {
        let (status, _, body) = send(Method::POST, "/api/generate-video", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["success"], true);
        let message = body["message"].as_str().unwrap();
        assert!(message.contains("a fox"));
        assert!(message.contains(expected), "{message}");
    }
}

#[tokio::test]
async fn test_index_accepts_get_and_post() {
    for method in [Method::GET, Method::POST] {
        let (status, _, body) = send(method, "/api", None).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["status"], "running");
        assert_eq!(body["endpoints"]["generateVideo"], "/api/generate-video");
        assert_eq!(body["endpoints"]["openapi"], "/openapi.json");
    }
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (status, headers, body) = send(Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["access-control-allow-methods"], "GET, OPTIONS");
    let body = json_body(&body);
    assert_eq!(body["openapi"], "3.0.0");
    assert_eq!(body["servers"][0]["url"], "http://localhost:3000");
    assert!(body["paths"]["/api/generate-video"]["post"].is_object());
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["status"], "ok");
}
