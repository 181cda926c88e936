use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("filename is empty")]
    EmptyFilename,

    #[error("extension of '{0}' is not an allowed video format")]
    InvalidExtension(String),
}

/// Returns the text after the last `.`, if there is one.
pub fn extension_of(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

/// Case-insensitive check of the filename's extension against the allowed set
pub fn is_allowed_file(filename: &str, allowed: &[String]) -> bool {
    extension_of(filename).is_some_and(|ext| {
        let ext = ext.to_lowercase();
        allowed.iter().any(|a| *a == ext)
    })
}

/// Reduces a client-supplied filename to a flat, ASCII-only basename.
///
/// The name is NFKD-normalized and stripped to ASCII first, so accented and
/// compatibility characters keep their base letter. Path separators turn
/// into word breaks, whitespace runs collapse to `_`,
/// anything outside `[A-Za-z0-9_.-]` is dropped and leading or trailing
/// `.`/`_` are trimmed. The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let spaced: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Validates an uploaded filename and returns the name it is stored under.
///
/// The extension is checked on the name the client sent and checked again on
/// the sanitized name, so a file is never stored under a name the listing
/// would hide.
pub fn validate_upload_filename(
    original: &str,
    allowed: &[String],
) -> Result<String, ValidationError> {
    if original.is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    if !is_allowed_file(original, allowed) {
        return Err(ValidationError::InvalidExtension(original.to_string()));
    }

    let sanitized = secure_filename(original);
    if sanitized != original {
        tracing::debug!(original = %original, sanitized = %sanitized, "Sanitized upload filename");
    }

    if !is_allowed_file(&sanitized, allowed) {
        tracing::warn!(
            original = %original,
            sanitized = %sanitized,
            "Sanitized filename lost its video extension"
        );
        return Err(ValidationError::InvalidExtension(original.to_string()));
    }

    Ok(sanitized)
}

/// True when `name` can only ever address an entry directly inside the
/// storage directory.
pub fn is_safe_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
