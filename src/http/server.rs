//! Application router and middleware stack.
//!
//! # Responsibilities
//! - Mount the root descriptor and the section routers
//! - Wire up middleware in pipeline order
//! - Answer unmatched paths with the JSON 404
//!
//! # Pipeline
//! ```text
//! request id → trace → security headers → compression → CORS
//!     → error handler → panic catcher → rate limit (/api)
//!     → body parsers → access log → routers | 404
//! ```

use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::error::{error_handler, panic_response, ErrorPolicy};
use crate::http::middleware::{access_log, body_parser, BodyLimits};
use crate::http::request::ClientIpSource;
use crate::http::response::not_found;
use crate::routing::{root_descriptor, ApiRoutes};
use crate::security::{build_cors_layer, rate_limit_middleware, security_headers, RateLimitState, RateLimiter};

/// Build the full application.
///
/// Axum applies `.layer` calls inside-out: the last layer added sees the
/// request first.
pub fn build_app(config: &ServerConfig, limiter: Arc<RateLimiter>, routes: ApiRoutes) -> Router {
    let client_ip = ClientIpSource::new(config.trust_proxy);
    let rate_limit = RateLimitState { limiter, client_ip };

    let app = Router::new().route("/", get(root_descriptor).fallback(not_found));

    routes
        .mount(app)
        .fallback(not_found)
        .layer(from_fn_with_state(client_ip, access_log))
        .layer(from_fn_with_state(BodyLimits::new(config.body_limit_bytes), body_parser))
        .layer(from_fn_with_state(rate_limit, rate_limit_middleware))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(ErrorPolicy::new(config.is_production()), error_handler))
        .layer(build_cors_layer(&config.allowed_origins))
        .layer(CompressionLayer::new())
        .layer(from_fn(security_headers))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::http::response::{ErrorBody, NOT_FOUND_MESSAGE};

    fn app() -> Router {
        let config = ServerConfig::default();
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        build_app(&config, limiter, ApiRoutes::new())
    }

    #[tokio::test]
    async fn unknown_path_is_json_404() {
        let response = app()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, ErrorBody::new(NOT_FOUND_MESSAGE));
    }

    #[tokio::test]
    async fn unregistered_section_falls_through_to_404() {
        let response = app()
            .oneshot(Request::get("/api/qcm/42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-ratelimit-limit"], "100");
    }
}
