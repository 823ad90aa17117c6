//! Maps toolkit errors to HTTP responses. Every failure becomes `{ "error": "..." }`;
//! nothing here ends the session.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use protokit_core::{ComposeError, FilesystemError, LaunchError, RegistryError};
use protokit_vision::InferenceError;

#[derive(Debug)]
pub struct ApiError(pub StatusCode, pub String);

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!("[GATEWAY] {} {}", self.0.as_u16(), self.1);
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

impl From<FilesystemError> for ApiError {
    fn from(e: FilesystemError) -> Self {
        let status = match &e {
            FilesystemError::NotFound(_) => StatusCode::NOT_FOUND,
            FilesystemError::InvalidId(_) => StatusCode::BAD_REQUEST,
            FilesystemError::AlreadyExists(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self(status, e.to_string())
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        let status = match &e {
            RegistryError::UnknownComponent(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self(status, e.to_string())
    }
}

impl From<ComposeError> for ApiError {
    fn from(e: ComposeError) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl From<LaunchError> for ApiError {
    fn from(e: LaunchError) -> Self {
        let status = match &e {
            LaunchError::MissingApp(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self(status, e.to_string())
    }
}

impl From<InferenceError> for ApiError {
    fn from(e: InferenceError) -> Self {
        let status = match &e {
            InferenceError::BadImage(_) => StatusCode::BAD_REQUEST,
            InferenceError::MissingVocabulary { .. }
            | InferenceError::EmptyVocabulary(_)
            | InferenceError::ModelLoad { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self(status, e.to_string())
    }
}
