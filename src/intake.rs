//! Image intake: validate an uploaded file and package it for the
//! model call.
//!
//! The whole buffer is held in memory so the same bytes back both the
//! preview and the submission; nothing touches disk.

use image::{GenericImageView, ImageFormat};

use crate::error::AppError;

/// One validated upload, alive for a single request.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
}

/// MIME type for the formats the uploader accepts.
fn mime_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        _ => None,
    }
}

fn extension_allowed(file_name: &str) -> bool {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => {
            matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png")
        }
        // No extension at all; content validation decides.
        None => true,
    }
}

/// Validate raw upload bytes and bundle them with their MIME type.
///
/// The MIME type is taken from the decoded content, not the filename,
/// so a JPEG renamed to `.png` is still labeled `image/jpeg`.
pub fn validate_and_package(
    file_name: Option<&str>,
    bytes: Vec<u8>,
) -> Result<ImagePayload, AppError> {
    if bytes.is_empty() {
        return Err(AppError::MissingFile);
    }

    if let Some(name) = file_name {
        if !name.is_empty() && !extension_allowed(name) {
            return Err(AppError::InvalidImage(format!(
                "unsupported file type \"{name}\"; upload a JPG, JPEG or PNG image"
            )));
        }
    }

    let format = image::guess_format(&bytes).map_err(|e| {
        AppError::InvalidImage(format!("unrecognized or corrupt image data: {e}"))
    })?;
    let mime = mime_for(format).ok_or_else(|| {
        AppError::InvalidImage(format!(
            "unsupported image format {format:?}; upload a JPG, JPEG or PNG image"
        ))
    })?;

    // Full decode, so truncated or corrupt files fail here and never
    // reach the model.
    let decoded = image::load_from_memory_with_format(&bytes, format).map_err(|e| {
        AppError::InvalidImage(format!("unrecognized or corrupt image data: {e}"))
    })?;

    let (width, height) = decoded.dimensions();
    Ok(ImagePayload {
        width,
        height,
        mime,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat};
    use std::io::Cursor;

    fn encoded(width: u32, height: u32, format: ImageOutputFormat) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn valid_png_packages_with_png_mime() {
        let bytes = encoded(100, 100, ImageOutputFormat::Png);
        let payload = validate_and_package(Some("apple.png"), bytes.clone()).unwrap();
        assert_eq!(payload.mime, "image/png");
        assert_eq!((payload.width, payload.height), (100, 100));
        assert_eq!(payload.bytes, bytes);
    }

    #[test]
    fn valid_jpeg_packages_with_jpeg_mime() {
        let bytes = encoded(64, 48, ImageOutputFormat::Jpeg(85));
        let payload = validate_and_package(Some("meal.jpg"), bytes).unwrap();
        assert_eq!(payload.mime, "image/jpeg");
        assert_eq!((payload.width, payload.height), (64, 48));
    }

    #[test]
    fn mime_follows_content_not_filename() {
        // A JPEG renamed to .png still gets labeled image/jpeg.
        let bytes = encoded(8, 8, ImageOutputFormat::Jpeg(85));
        let payload = validate_and_package(Some("renamed.png"), bytes).unwrap();
        assert_eq!(payload.mime, "image/jpeg");
    }

    #[test]
    fn garbage_bytes_rejected() {
        let err = validate_and_package(Some("photo.png"), b"not an image".to_vec()).unwrap_err();
        assert!(matches!(err, AppError::InvalidImage(_)));
        assert!(err.to_string().contains("unrecognized or corrupt"));
    }

    #[test]
    fn empty_upload_is_missing_file() {
        let err = validate_and_package(Some("photo.png"), Vec::new()).unwrap_err();
        assert!(matches!(err, AppError::MissingFile));
    }

    #[test]
    fn disallowed_extension_rejected() {
        let bytes = encoded(4, 4, ImageOutputFormat::Png);
        let err = validate_and_package(Some("photo.gif"), bytes).unwrap_err();
        assert!(matches!(err, AppError::InvalidImage(_)));
        assert!(err.to_string().contains("unsupported file type"));
    }

    #[test]
    fn unsupported_format_rejected_even_with_good_extension() {
        let bytes = encoded(4, 4, ImageOutputFormat::Bmp);
        let err = validate_and_package(Some("photo.png"), bytes).unwrap_err();
        assert!(matches!(err, AppError::InvalidImage(_)));
    }

    #[test]
    fn dotless_filename_falls_back_to_content_validation() {
        let bytes = encoded(10, 10, ImageOutputFormat::Png);
        let payload = validate_and_package(Some("photo"), bytes).unwrap();
        assert_eq!(payload.mime, "image/png");

        let err = validate_and_package(Some("photo"), b"not an image".to_vec()).unwrap_err();
        assert!(matches!(err, AppError::InvalidImage(_)));
    }

    #[test]
    fn missing_filename_still_validates_content() {
        let bytes = encoded(10, 10, ImageOutputFormat::Png);
        let payload = validate_and_package(None, bytes).unwrap();
        assert_eq!(payload.mime, "image/png");
    }
}
