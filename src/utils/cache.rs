use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Stored videos can be replaced under the same name, so clients must
/// revalidate on every use.
pub const CACHE_CONTROL: &str = "no-cache";

/// Validators for a stored video, derived from its size and mtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheValidator {
    etag: String,
    last_modified: Option<DateTime<Utc>>,
}

impl CacheValidator {
    pub fn new(size: u64, modified: Option<SystemTime>) -> Self {
        let etag = match modified.and_then(|m| m.duration_since(UNIX_EPOCH).ok()) {
            Some(since_epoch) => format!(
                "\"{:x}.{:x}-{:x}\"",
                since_epoch.as_secs(),
                since_epoch.subsec_nanos(),
                size
            ),
            None => format!("\"{:x}\"", size),
        };

        Self {
            etag,
            last_modified: modified.map(DateTime::<Utc>::from),
        }
    }

    /// Quoted strong entity tag.
    pub fn etag(&self) -> &str {
        &self.etag
    }

    /// RFC 1123 date for the `Last-Modified` header.
    pub fn last_modified(&self) -> Option<String> {
        self.last_modified
            .map(|dt| dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
    }

    /// Whether a conditional GET can be answered with 304. `If-None-Match`
    /// wins over `If-Modified-Since` when both are sent.
    pub fn is_not_modified(&self, headers: &HeaderMap) -> bool {
        if let Some(value) = headers.get(header::IF_NONE_MATCH) {
            return value
                .to_str()
                .map(|tags| self.matches_any(tags))
                .unwrap_or(false);
        }

        let since = headers
            .get(header::IF_MODIFIED_SINCE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date);

        match (self.last_modified, since) {
            (Some(modified), Some(since)) => modified.timestamp() <= since.timestamp(),
            _ => false,
        }
    }

    /// Whether a `Range` header should be honoured given `If-Range`.
    /// A stale `If-Range` means the whole current file is sent instead.
    pub fn range_applies(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers.get(header::IF_RANGE) else {
            return true;
        };
        let Ok(value) = value.to_str() else {
            return false;
        };
        let value = value.trim();

        if value.starts_with('"') || value.starts_with("W/") {
            // If-Range requires a strong comparison.
            return value == self.etag;
        }

        match (self.last_modified, parse_http_date(value)) {
            (Some(modified), Some(date)) => modified.timestamp() == date.timestamp(),
            _ => false,
        }
    }

    fn matches_any(&self, tags: &str) -> bool {
        tags.split(',').map(str::trim).any(|tag| {
            tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == self.etag
        })
    }
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
