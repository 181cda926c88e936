use std::env;
use std::path::PathBuf;

/// Extensions accepted when nothing else is configured.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["mp4", "avi", "mov"];

/// Runtime configuration for the video store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Flat directory holding the uploaded videos (default: "uploads")
    pub upload_folder: PathBuf,

    /// Lowercase extensions, without the leading dot (default: mp4, avi, mov)
    pub allowed_extensions: Vec<String>,

    /// Maximum request body size in bytes (default: 1 GB)
    pub max_file_size: usize,

    /// Serialize concurrent uploads that target the same filename (default: false)
    pub serialize_writes: bool,

    /// Allowed CORS origins; empty means any origin
    pub allowed_origins: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            upload_folder: PathBuf::from("uploads"),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            max_file_size: 1024 * 1024 * 1024, // 1 GB
            serialize_writes: false,
            allowed_origins: Vec::new(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            upload_folder: env::var("UPLOAD_FOLDER")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.upload_folder),

            allowed_extensions: env::var("ALLOWED_EXTENSIONS")
                .ok()
                .map(|v| parse_extensions(&v))
                .filter(|exts| !exts.is_empty())
                .unwrap_or(default.allowed_extensions),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            serialize_writes: env::var("SERIALIZE_WRITES")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.serialize_writes),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| parse_list(&v))
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Config rooted at an arbitrary directory, used by tests and local runs.
    pub fn development(upload_folder: impl Into<PathBuf>) -> Self {
        Self {
            upload_folder: upload_folder.into(),
            max_file_size: 64 * 1024 * 1024,
            ..Self::default()
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Normalizes ".MP4, mov" style input into `["mp4", "mov"]`.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    parse_list(raw)
        .into_iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.upload_folder, PathBuf::from("uploads"));
        assert_eq!(config.allowed_extensions, vec!["mp4", "avi", "mov"]);
        assert_eq!(config.max_file_size, 1024 * 1024 * 1024);
        assert!(!config.serialize_writes);
        assert!(config.allowed_origins.is_empty());
    }

    #[test]
    fn test_development_config() {
        let config = StoreConfig::development("/tmp/videos");
        assert_eq!(config.upload_folder, PathBuf::from("/tmp/videos"));
        assert_eq!(config.allowed_extensions, vec!["mp4", "avi", "mov"]);
        assert_eq!(config.max_file_size, 64 * 1024 * 1024);
    }

    #[test]
    fn test_parse_extensions() {
        assert_eq!(parse_extensions(".MP4, mov ,,webm"), vec!["mp4", "mov", "webm"]);
        assert!(parse_extensions(" , ").is_empty());
    }
}
