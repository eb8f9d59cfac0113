//! Upload validation and photo preprocessing for the quote pipeline.
//!
//! Uploaded photos are bounded, decoded, downscaled to fit the model's
//! input budget, and re-encoded as JPEG before being base64-inlined in
//! the analysis request. The original bytes are kept on disk untouched.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use thiserror::Error;

/// Longest edge sent to the vision model.
pub const MAX_DIMENSION: u32 = 1024;

const JPEG_QUALITY: u8 = 85;

const SUPPORTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload exceeds the {max_bytes} byte limit")]
    TooLarge { max_bytes: usize },
    #[error("unsupported image type `{0}` (expected image/jpeg, image/png, or image/webp)")]
    UnsupportedType(String),
    #[error("uploaded file is not a readable image")]
    Undecodable,
}

/// A photo ready for the vision model.
#[derive(Debug)]
pub struct ProcessedPhoto {
    pub jpeg_base64: String,
    pub width: u32,
    pub height: u32,
}

pub fn is_supported_mime(mime: &str) -> bool {
    SUPPORTED_MIME_TYPES.contains(&mime)
}

/// File extension used when persisting the original upload.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Validates and converts raw upload bytes into model-ready JPEG data.
///
/// Large photos are downscaled to fit [`MAX_DIMENSION`] on the longest
/// edge preserving aspect ratio; smaller photos are never enlarged.
pub fn preprocess(bytes: &[u8], mime: &str, max_bytes: usize) -> Result<ProcessedPhoto, UploadError> {
    if bytes.len() > max_bytes {
        return Err(UploadError::TooLarge { max_bytes });
    }
    if !is_supported_mime(mime) {
        return Err(UploadError::UnsupportedType(mime.to_string()));
    }

    let decoded = image::load_from_memory(bytes).map_err(|_| UploadError::Undecodable)?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(UploadError::Undecodable);
    }

    let resized = if decoded.width() > MAX_DIMENSION || decoded.height() > MAX_DIMENSION {
        decoded.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
    } else {
        decoded
    };

    let rgb = resized.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|_| UploadError::Undecodable)?;

    Ok(ProcessedPhoto {
        jpeg_base64: BASE64_STANDARD.encode(&jpeg),
        width: rgb.width(),
        height: rgb.height(),
    })
}
