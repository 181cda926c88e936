use crate::services::storage::StorageError;
use crate::utils::validation::ValidationError;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Body of every error response
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No file part")]
    MissingFilePart,

    #[error("No selected file")]
    EmptyFilename,

    #[error("Invalid file format")]
    InvalidExtension,

    #[error("Not Found")]
    NotFound,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Range Not Satisfiable")]
    RangeNotSatisfiable { size: u64 },

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    /// Classifies a failure of the incoming multipart stream.
    pub fn from_multipart(err: &MultipartError) -> Self {
        let message = err.body_text();
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE
            || message.contains("length limit exceeded")
        {
            AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
        } else {
            AppError::BadRequest(message)
        }
    }

    /// Same as [`AppError::from_multipart`] for errors that passed through an
    /// `AsyncRead` adapter.
    pub fn from_upload_io(err: &std::io::Error) -> Self {
        match err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<MultipartError>())
        {
            Some(multipart) => AppError::from_multipart(multipart),
            None => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyFilename => AppError::EmptyFilename,
            ValidationError::InvalidExtension(_) => AppError::InvalidExtension,
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) | StorageError::InvalidKey(_) => AppError::NotFound,
            StorageError::Unavailable(e) => AppError::StorageUnavailable(e.to_string()),
            StorageError::Source(e) => AppError::from_upload_io(&e),
            StorageError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut content_range = None;

        let (status, message) = match self {
            AppError::MissingFilePart => (StatusCode::BAD_REQUEST, "No file part".to_string()),
            AppError::EmptyFilename => (StatusCode::BAD_REQUEST, "No selected file".to_string()),
            AppError::InvalidExtension => {
                (StatusCode::BAD_REQUEST, "Invalid file format".to_string())
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::StorageUnavailable(msg) => {
                tracing::error!("Storage unavailable: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage unavailable".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::RangeNotSatisfiable { size } => {
                content_range = HeaderValue::from_str(&format!("bytes */{}", size)).ok();
                (StatusCode::RANGE_NOT_SATISFIABLE, "Range Not Satisfiable".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let mut response = (status, Json(ErrorResponse { error: message })).into_response();
        if let Some(value) = content_range {
            response.headers_mut().insert(header::CONTENT_RANGE, value);
        }
        response
    }
}
