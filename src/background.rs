// Optional card background image, carried as a self-contained data URL

use std::io::Read;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::AppError;

/// An inline-encoded image that replaces the theme gradient on every card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundImage {
    data_url: String,
}

impl BackgroundImage {
    /// Wraps an existing data URL. An empty string means "no background".
    pub fn from_data_url(url: &str) -> Option<Self> {
        if url.is_empty() {
            None
        } else {
            Some(Self {
                data_url: url.to_string(),
            })
        }
    }

    /// Encodes raw image bytes. The bytes must decode as an image; the MIME
    /// type is sniffed from the content.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AppError> {
        let format = ::image::guess_format(bytes)
            .map_err(|e| AppError::BackgroundError(format!("Unrecognized image: {}", e)))?;
        ::image::load_from_memory_with_format(bytes, format)
            .map_err(|e| AppError::BackgroundError(format!("Failed to decode image: {}", e)))?;

        Ok(Self {
            data_url: format!("data:{};base64,{}", format.to_mime_type(), BASE64.encode(bytes)),
        })
    }

    pub fn as_data_url(&self) -> &str {
        &self.data_url
    }
}

/// Loads a background from a file path or an http(s) URL.
pub fn load_background(source: &str) -> Result<BackgroundImage, AppError> {
    let image_bytes = if source.starts_with("http://") || source.starts_with("https://") {
        let response = ureq::get(source)
            .call()
            .map_err(|e| AppError::BackgroundError(format!("Failed to fetch URL: {}", e)))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| AppError::BackgroundError(format!("Failed to read response: {}", e)))?;
        bytes
    } else {
        std::fs::read(source)
            .map_err(|e| AppError::BackgroundError(format!("{}: {}", source, e)))?
    };

    tracing::debug!(source, bytes = image_bytes.len(), "loaded background image");
    BackgroundImage::from_bytes(&image_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let img = ::image::RgbImage::from_pixel(2, 2, ::image::Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ::image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn empty_url_clears_background() {
        assert!(BackgroundImage::from_data_url("").is_none());
        let bg = BackgroundImage::from_data_url("data:image/png;base64,AAAA").unwrap();
        assert_eq!(bg.as_data_url(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn png_bytes_become_png_data_url() {
        let bg = BackgroundImage::from_bytes(&tiny_png()).unwrap();
        assert!(bg.as_data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn non_image_bytes_are_rejected() {
        let result = BackgroundImage::from_bytes(b"definitely not an image");
        assert!(matches!(result, Err(AppError::BackgroundError(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let result = load_background("no/such/background.png");
        assert!(matches!(result, Err(AppError::BackgroundError(_))));
    }
}
