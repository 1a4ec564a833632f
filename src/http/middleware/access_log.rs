//! Access logging.
//!
//! One info event per request that got past admission control. Emitting a
//! tracing event cannot fail, so the request is never held up by logging.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::http::request::{ClientIpSource, X_REQUEST_ID};

pub async fn access_log(State(client_ip): State<ClientIpSource>, req: Request, next: Next) -> Response {
    let headers = req.headers();

    tracing::info!(
        request_id = %header_or_dash(headers, X_REQUEST_ID),
        ip = %client_ip.key(&req),
        user_agent = %header_or_dash(headers, header::USER_AGENT.as_str()),
        "{} {}",
        req.method(),
        req.uri().path()
    );

    next.run(req).await
}

fn header_or_dash<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;
    use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};

    #[test]
    fn missing_or_binary_headers_log_as_dash() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, "7f1c".parse().unwrap());
        headers.insert(header::USER_AGENT, axum::http::HeaderValue::from_bytes(b"\xff").unwrap());

        assert_eq!(header_or_dash(&headers, X_REQUEST_ID), "7f1c");
        assert_eq!(header_or_dash(&headers, header::USER_AGENT.as_str()), "-");
        assert_eq!(header_or_dash(&headers, "referer"), "-");
    }

    #[tokio::test]
    async fn generated_request_id_is_visible_to_the_logger() {
        let app = Router::new()
            .route(
                "/",
                get(|headers: HeaderMap| async move { header_or_dash(&headers, X_REQUEST_ID).len().to_string() }),
            )
            .layer(from_fn_with_state(ClientIpSource::default(), access_log))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        // Hyphenated UUID.
        assert_eq!(&body[..], b"36");
    }
}
