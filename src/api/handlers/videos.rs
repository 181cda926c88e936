use crate::AppState;
use crate::api::error::AppError;
use crate::services::storage::VideoObject;
use crate::utils::cache::{self, CacheValidator};
use crate::utils::content_type::content_type_for;
use crate::utils::range::{ByteRange, parse_range};
use crate::utils::validation::{is_allowed_file, is_safe_segment, validate_upload_filename};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use futures::TryStreamExt;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use std::io::SeekFrom;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::{ReaderStream, StreamReader};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

#[derive(Serialize, ToSchema)]
pub struct VideoEntry {
    pub filename: String,
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = Multipart, description = "Video upload, multipart field `file`"),
    responses(
        (status = 200, description = "Video stored", body = UploadResponse),
        (status = 400, description = "No file part, no selected file or invalid file format", body = crate::api::error::ErrorResponse),
        (status = 413, description = "Request body too large", body = crate::api::error::ErrorResponse)
    ),
    tag = "videos"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    // Anything that is not a multipart form simply carries no file part.
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Upload without multipart body: {}", e);
        AppError::MissingFilePart
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::from_multipart(&e))?
    {
        if field.name() != Some("file") {
            continue;
        }

        // A `file` field without a filename attribute is a plain form value.
        let Some(original_filename) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let filename =
            validate_upload_filename(&original_filename, &state.config.allowed_extensions)?;

        let _guard = if state.config.serialize_writes {
            Some(state.write_locks.lock(&filename).await)
        } else {
            None
        };

        let reader = StreamReader::new(field.map_err(std::io::Error::other));
        let size = state.storage.save_stream(&filename, Box::new(reader)).await?;
        tracing::info!(filename = %filename, size_bytes = size, "📼 Video uploaded");

        return Ok(Json(UploadResponse {
            message: "Video uploaded successfully".to_string(),
            filename,
        }));
    }

    Err(AppError::MissingFilePart)
}

/// `inline` disposition with a plain ASCII fallback name for old clients
/// and the exact name percent-encoded per RFC 5987.
fn content_disposition(filename: &str) -> String {
    let ascii_filename: String = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && !matches!(c, '"' | '\\' | ';'))
        .take(64)
        .collect();
    let fallback = if ascii_filename.is_empty() {
        "video"
    } else {
        &ascii_filename
    };

    format!(
        "inline; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        utf8_percent_encode(filename, NON_ALPHANUMERIC)
    )
}

#[utoipa::path(
    get,
    path = "/video/{filename}",
    params(
        ("filename" = String, Path, description = "Stored video filename")
    ),
    responses(
        (status = 200, description = "Video bytes"),
        (status = 206, description = "Requested byte range"),
        (status = 304, description = "Client copy is current"),
        (status = 404, description = "Video not found", body = crate::api::error::ErrorResponse),
        (status = 416, description = "Range not satisfiable", body = crate::api::error::ErrorResponse)
    ),
    tag = "videos"
)]
pub async fn get_video(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if !is_safe_segment(&filename) {
        tracing::warn!("Rejected video path outside storage: {:?}", filename);
        return Err(AppError::NotFound);
    }

    let VideoObject {
        mut file,
        size,
        modified,
    } = state.storage.open(&filename).await?;

    let validator = CacheValidator::new(size, modified);

    let mut builder = Response::builder()
        .header(header::ETAG, validator.etag())
        .header(header::CACHE_CONTROL, cache::CACHE_CONTROL);
    if let Some(last_modified) = validator.last_modified() {
        builder = builder.header(header::LAST_MODIFIED, last_modified);
    }

    if validator.is_not_modified(&headers) {
        return builder
            .status(StatusCode::NOT_MODIFIED)
            .body(Body::empty())
            .map_err(|e| AppError::Internal(format!("Failed to build video response: {}", e)));
    }

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .filter(|_| validator.range_applies(&headers))
        .map(|r| parse_range(r, size))
        .unwrap_or(ByteRange::Full);

    let builder = builder
        .header(header::CONTENT_TYPE, content_type_for(&filename))
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_DISPOSITION, content_disposition(&filename));

    let response = match range {
        ByteRange::Full => builder
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, size)
            .body(Body::from_stream(ReaderStream::new(file))),
        ByteRange::Partial { start, end } => {
            file.seek(SeekFrom::Start(start))
                .await
                .map_err(|e| AppError::Internal(format!("Failed to seek {}: {}", filename, e)))?;
            let length = range.len();

            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_LENGTH, length)
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", start, end, size),
                )
                .body(Body::from_stream(ReaderStream::new(file.take(length))))
        }
        ByteRange::Unsatisfiable => return Err(AppError::RangeNotSatisfiable { size }),
    };

    response.map_err(|e| AppError::Internal(format!("Failed to build video response: {}", e)))
}

#[utoipa::path(
    get,
    path = "/video-list",
    responses(
        (status = 200, description = "Stored videos, in directory order", body = [VideoEntry]),
        (status = 500, description = "Storage directory unreadable", body = crate::api::error::ErrorResponse)
    ),
    tag = "videos"
)]
pub async fn list_videos(State(state): State<AppState>) -> Result<Json<Vec<VideoEntry>>, AppError> {
    let names = state.storage.list().await?;

    let videos = names
        .into_iter()
        .filter(|name| is_allowed_file(name, &state.config.allowed_extensions))
        .map(|filename| VideoEntry { filename })
        .collect();

    Ok(Json(videos))
}
