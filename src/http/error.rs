//! Application errors and the central error handler.
//!
//! Handlers and middleware return [`AppError`]. Converting it into a response
//! only records an [`ErrorReport`] in the response extensions; the
//! [`error_handler`] middleware is the single place that logs the failure and
//! decides what the client is allowed to see.

use std::any::Any;

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::response::{json_error, GENERIC_ERROR_MESSAGE};

/// Errors surfaced while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("request entity too large")]
    PayloadTooLarge { limit: usize },

    #[error("{0}")]
    MalformedBody(String),

    #[error("unsupported charset \"{0}\"")]
    UnsupportedCharset(String),

    /// Error with a status chosen by the handler.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),

    #[error("{0}")]
    Panic(String),
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedCharset(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Status { status, .. } => *status,
            Self::Database(_) | Self::Panic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn source_chain(&self) -> Vec<String> {
        let mut chain = Vec::new();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }
        chain
    }
}

/// What the error handler needs to log and render an [`AppError`].
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
    pub stack: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = ErrorReport {
            status: self.status(),
            message: self.to_string(),
            stack: self.source_chain(),
        };
        // Generic until the error handler decides the message may be shown.
        let mut response = json_error(report.status, GENERIC_ERROR_MESSAGE);
        response.extensions_mut().insert(report);
        response
    }
}

/// Message disclosure policy of the error handler.
#[derive(Debug, Clone, Copy)]
pub struct ErrorPolicy {
    redact: bool,
}

impl ErrorPolicy {
    /// Production hides error text behind [`GENERIC_ERROR_MESSAGE`].
    pub fn new(production: bool) -> Self {
        Self { redact: production }
    }

    fn client_message(&self, report: ErrorReport) -> String {
        if self.redact {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            report.message
        }
    }
}

pub async fn error_handler(State(policy): State<ErrorPolicy>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    let mut response = next.run(req).await;

    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };

    tracing::error!(
        error = %report.message,
        stack = ?report.stack,
        path = %path,
        status = report.status.as_u16(),
        "Server error"
    );

    let status = report.status;
    let mut rendered = json_error(status, policy.client_message(report));
    let own: Vec<HeaderName> = rendered.headers().keys().cloned().collect();
    // Iterating yields every value of a repeated header, e.g. several `set-cookie`.
    for (name, value) in response.headers() {
        if name != header::CONTENT_LENGTH && !own.contains(name) {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }
    rendered
}

/// Turns a handler panic into a 500 that flows through [`error_handler`].
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };
    AppError::Panic(message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::PayloadTooLarge { limit: 1 }.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(AppError::MalformedBody("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::new(StatusCode::CONFLICT, "taken").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::Panic("boom".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn response_carries_report_and_generic_body() {
        let response = AppError::new(StatusCode::IM_A_TEAPOT, "short and stout").into_response();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);

        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.message, "short and stout");
        assert_eq!(report.status, StatusCode::IM_A_TEAPOT);
    }

    #[test]
    fn panic_payloads_are_described() {
        let response = panic_response(Box::new("static str"));
        assert_eq!(response.extensions().get::<ErrorReport>().unwrap().message, "static str");

        let response = panic_response(Box::new(String::from("owned")));
        assert_eq!(response.extensions().get::<ErrorReport>().unwrap().message, "owned");

        let response = panic_response(Box::new(42_u8));
        assert_eq!(
            response.extensions().get::<ErrorReport>().unwrap().message,
            "handler panicked"
        );
    }

    #[tokio::test]
    async fn rerendering_keeps_repeated_headers() {
        use axum::{body::Body, middleware::from_fn_with_state, response::AppendHeaders, routing::get, Router};
        use tower::ServiceExt;

        let app = Router::new()
            .route(
                "/",
                get(|| async {
                    (
                        AppendHeaders([
                            (header::SET_COOKIE, "session=abc"),
                            (header::SET_COOKIE, "locale=ro"),
                            (header::VARY, "origin"),
                            (header::VARY, "accept-encoding"),
                        ]),
                        AppError::new(StatusCode::FORBIDDEN, "quiz locked"),
                    )
                }),
            )
            .layer(from_fn_with_state(ErrorPolicy::new(false), error_handler));

        let response = app
            .oneshot(axum::http::Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let headers = response.headers();
        let cookies: Vec<_> = headers.get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies, ["session=abc", "locale=ro"]);
        assert_eq!(headers.get_all(header::VARY).iter().count(), 2);
        assert_eq!(headers.get_all(header::CONTENT_TYPE).iter().count(), 1);
    }

    #[test]
    fn policy_redacts_only_in_production() {
        let report = || ErrorReport {
            status: StatusCode::BAD_REQUEST,
            message: "bad field".into(),
            stack: Vec::new(),
        };
        assert_eq!(ErrorPolicy::new(true).client_message(report()), GENERIC_ERROR_MESSAGE);
        assert_eq!(ErrorPolicy::new(false).client_message(report()), "bad field");
    }
}
