use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// The browser client is served from another origin and sends bearer tokens,
/// never cookies.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(Any)
}
