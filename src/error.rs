//! Error taxonomy for the API surface and the `{success, data?, error?}`
//! envelope every handler speaks. Services return `Result`; the envelope is
//! produced exactly once, here and in `Envelope::ok`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::stores::StoreError;

pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or invalid access token.
    #[error("unauthorized")]
    Unauthorized,
    /// Caller lacks the required role.
    #[error("forbidden")]
    Forbidden,
    /// The string is shown to the user as-is.
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Store(StoreError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Store(StoreError::Malformed(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Niet ingelogd".to_string(),
            ApiError::Forbidden => "Geen toegang".to_string(),
            ApiError::NotFound(what) => what.clone(),
            ApiError::Store(_) => "Gegevens zijn tijdelijk niet beschikbaar".to_string(),
            ApiError::Internal(_) => "Er is iets misgegaan".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({ "success": false, "error": self.public_message() }));
        (status, body).into_response()
    }
}

/// Success half of the result envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Json<Envelope<T>> {
        Json(Envelope {
            success: true,
            data,
        })
    }
}
