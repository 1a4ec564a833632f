//! JSON envelope shared by every non-success response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Body of the 404 handler.
pub const NOT_FOUND_MESSAGE: &str = "Route non trouvée";

/// Message replacing error details when running in production.
pub const GENERIC_ERROR_MESSAGE: &str = "Une erreur est survenue";

/// `{ "success": false, "error": "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

/// Fallback for every path no router claimed.
pub async fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
}
