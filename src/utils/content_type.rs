use super::validation::extension_of;

/// Content type served for a stored video, inferred from its extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let extension = extension_of(filename).unwrap_or("").to_lowercase();
    match extension.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "ogg" | "ogv" => "video/ogg",
        "mpeg" | "mpg" => "video/mpeg",
        "ts" => "video/mp2t",
        _ => "application/octet-stream",
    }
}
