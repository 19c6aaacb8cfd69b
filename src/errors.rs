use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

pub const UNSUPPORTED_IMAGE_MESSAGE: &str = "Only static image files are supported";

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

/// Reasons an upload never reaches handler logic.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{}", UNSUPPORTED_IMAGE_MESSAGE)]
    UnsupportedMediaType,
    #[error("{message}")]
    Validation { status: StatusCode, message: String },
    #[error("File is required")]
    MissingFile,
    #[error("Unexpected field")]
    UnexpectedField,
    #[error(transparent)]
    Multipart(#[from] MultipartError),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            UploadError::Validation { status, .. } => *status,
            UploadError::MissingFile | UploadError::UnexpectedField => StatusCode::BAD_REQUEST,
            UploadError::Multipart(err) => err.status(),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let message = match &err {
            UploadError::Multipart(inner) => inner.body_text(),
            other => other.to_string(),
        };
        AppError::new(err.status(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_errors_map_to_their_status_codes() {
        let cases = [
            (UploadError::UnsupportedMediaType, 415, UNSUPPORTED_IMAGE_MESSAGE),
            (UploadError::MissingFile, 400, "File is required"),
            (UploadError::UnexpectedField, 400, "Unexpected field"),
            (
                UploadError::Validation {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    message: "too big".into(),
                },
                422,
                "too big",
            ),
        ];

        for (err, status, message) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status.as_u16(), status);
            assert_eq!(app.message, message);
        }
    }

    #[test]
    fn anyhow_errors_become_internal() {
        let app: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(app.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app.to_string(), "boom");
    }
}
