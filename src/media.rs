use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::ImageFormat;

pub const VIDEO_MIME_TYPE: &str = "video/mp4";
const FALLBACK_IMAGE_MIME_TYPE: &str = "image/jpeg";

/// A binary payload carried inline as `data:<mime>;base64,<payload>`.
#[derive(Clone, Debug)]
pub struct DataUrl {
    pub mime_type: String,
    pub base64_len: usize,
    pub url: String,
}

impl DataUrl {
    pub fn encode(mime_type: &str, bytes: &[u8]) -> Self {
        let encoded = STANDARD.encode(bytes);
        Self {
            mime_type: mime_type.to_string(),
            base64_len: encoded.len(),
            url: format!("data:{mime_type};base64,{encoded}"),
        }
    }
}

/// MIME type and display tag for generated image bytes. Unknown payloads are
/// reported as JPEG, which is what the upstream model returns by default.
pub fn detect_image_format(bytes: &[u8]) -> (&'static str, &'static str) {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => ("image/png", "PNG"),
        Ok(ImageFormat::Jpeg) => ("image/jpeg", "JPEG"),
        Ok(ImageFormat::WebP) => ("image/webp", "WEBP"),
        Ok(ImageFormat::Gif) => ("image/gif", "GIF"),
        Ok(ImageFormat::Bmp) => ("image/bmp", "BMP"),
        _ => (FALLBACK_IMAGE_MIME_TYPE, "JPEG"),
    }
}

/// Approximate decoded size in whole kilobytes.
pub fn base64_size_kb(base64_len: usize) -> u64 {
    (base64_len as f64 * 0.75 / 1024.0).round() as u64
}

/// Approximate decoded size in megabytes, two decimals.
pub fn base64_size_mb(base64_len: usize) -> f64 {
    (base64_len as f64 * 0.75 / 1024.0 / 1024.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_has_mime_prefix() {
        let data = DataUrl::encode("image/png", b"abc");
        assert_eq!(data.url, "data:image/png;base64,YWJj");
        assert_eq!(data.base64_len, 4);
    }

    #[test]
    fn detects_png_and_falls_back_to_jpeg() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(detect_image_format(&png), ("image/png", "PNG"));
        assert_eq!(detect_image_format(b"not an image"), ("image/jpeg", "JPEG"));
    }

    #[test]
    fn size_estimates_round() {
        assert_eq!(base64_size_kb(0), 0);
        assert_eq!(base64_size_kb(1366), 1);
        assert_eq!(base64_size_mb(1_398_102), 1.0);
        assert_eq!(base64_size_mb(100), 0.0);
    }
}
