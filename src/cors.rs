use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::method_not_allowed;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accepted {
    Any,
    PostOnly,
}

/// Cross-origin headers and accepted verbs for one route.
#[derive(Clone, Copy, Debug)]
pub struct CorsPolicy {
    pub allow_methods: &'static str,
    pub allow_headers: &'static str,
    pub accepted: Accepted,
}

pub const PROXY_POLICY: CorsPolicy = CorsPolicy {
    allow_methods: "GET, POST, OPTIONS",
    allow_headers: "Content-Type, Authorization",
    accepted: Accepted::PostOnly,
};

pub const DEMO_POLICY: CorsPolicy = CorsPolicy {
    allow_methods: "POST, OPTIONS",
    allow_headers: "Content-Type",
    accepted: Accepted::PostOnly,
};

pub const INDEX_POLICY: CorsPolicy = CorsPolicy {
    allow_methods: "GET, POST, OPTIONS",
    allow_headers: "Content-Type",
    accepted: Accepted::Any,
};

pub const DOCUMENT_POLICY: CorsPolicy = CorsPolicy {
    allow_methods: "GET, OPTIONS",
    allow_headers: "Content-Type",
    accepted: Accepted::Any,
};

impl CorsPolicy {
    pub fn accepts(&self, method: &Method) -> bool {
        match self.accepted {
            Accepted::Any => true,
            Accepted::PostOnly => method == Method::POST,
        }
    }

    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(self.allow_methods),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(self.allow_headers),
        );
    }
}

/// Wraps a route: answers preflight with an empty 200, rejects verbs the
/// route does not accept, and stamps the CORS headers on every response.
pub async fn cors_shim(
    State(policy): State<CorsPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let mut response = if method == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else if !policy.accepts(&method) {
        method_not_allowed(method.as_str())
    } else {
        next.run(request).await
    };
    policy.apply_headers(response.headers_mut());
    response
}
