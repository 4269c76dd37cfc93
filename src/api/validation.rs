use std::path::Path;

use crate::api::errors::ApiError;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv"];

pub(crate) fn validate_password_len(password: &str) -> Result<(), ApiError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )))
    }
}

/// Trims a required text field, rejecting blank input with `message`.
pub(crate) fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, ApiError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError::BadRequest(message.to_string())),
    }
}

pub(crate) fn validate_video_upload(filename: &str, content_type: &str) -> Result<(), ApiError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| ApiError::BadRequest("File must have an extension".to_string()))?;

    if !VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ApiError::BadRequest(format!("File extension '{extension}' is not allowed")));
    }

    let mime = content_type.trim().to_ascii_lowercase();
    if mime_allowed_for_extension(&mime, &extension) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "MIME type '{mime}' does not match extension '.{extension}'"
        )))
    }
}

fn mime_allowed_for_extension(mime: &str, extension: &str) -> bool {
    match extension {
        "mp4" => matches!(mime, "video/mp4" | "application/octet-stream"),
        "webm" => mime == "video/webm",
        "mov" => matches!(mime, "video/quicktime" | "video/mov"),
        "mkv" => matches!(mime, "video/x-matroska" | "application/octet-stream"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_length_counts_chars() {
        assert!(validate_password_len("12345678").is_ok());
        assert!(validate_password_len("1234567").is_err());
        assert!(validate_password_len("пароль12").is_ok());
    }

    #[test]
    fn required_rejects_blank_values() {
        assert_eq!(required(Some("  a@b.c "), "Email is required").unwrap(), "a@b.c");
        assert!(matches!(
            required(Some("   "), "Email is required"),
            Err(ApiError::BadRequest(message)) if message == "Email is required"
        ));
        assert!(required(None, "Email is required").is_err());
    }

    #[test]
    fn video_upload_checks_extension_and_mime() {
        assert!(validate_video_upload("intro.MP4", "video/mp4").is_ok());
        assert!(validate_video_upload("intro.webm", "video/webm").is_ok());
        assert!(validate_video_upload("intro", "video/mp4").is_err());
        assert!(validate_video_upload("intro.exe", "video/mp4").is_err());
        assert!(validate_video_upload("intro.webm", "video/mp4").is_err());
    }
}
