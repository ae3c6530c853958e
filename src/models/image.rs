use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageSize {
    fn default() -> Self {
        ImageSize {
            width: 1024,
            height: 1024,
        }
    }
}

impl FromStr for ImageSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidSize(s.to_string());
        let (w, h) = s
            .trim()
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(ImageSize { width, height })
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageModel {
    pub id: String,
    pub max_images: u32,
}

/// Body of `POST /v1/images/generations`.
#[derive(Debug, Clone, Serialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub width: u32,
    pub height: u32,
}

impl ImageGenerationRequest {
    pub fn new(model: &str, prompt: &str, count: u32, size: ImageSize) -> Self {
        Self {
            model: model.to_string(),
            prompt: prompt.to_string(),
            n: count.max(1),
            width: size.width,
            height: size.height,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageGenerationResponse {
    pub data: Vec<GeneratedImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        let size: ImageSize = "512x768".parse().unwrap();
        assert_eq!(size, ImageSize { width: 512, height: 768 });
        assert_eq!(size.to_string(), "512x768");
        assert_eq!("1024X1024".parse::<ImageSize>().unwrap(), ImageSize::default());
    }

    #[test]
    fn rejects_bad_sizes() {
        for bad in ["", "1024", "0x512", "axb", "512x"] {
            assert!(matches!(bad.parse::<ImageSize>(), Err(Error::InvalidSize(_))), "{bad}");
        }
    }

    #[test]
    fn request_body_splits_size() {
        let request = ImageGenerationRequest::new("sdxl", "a fox", 3, "640x480".parse().unwrap());
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"model": "sdxl", "prompt": "a fox", "n": 3, "width": 640, "height": 480})
        );
    }
}
