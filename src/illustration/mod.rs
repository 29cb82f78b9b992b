//! Illustration generation from a short design description.
//!
//! Backends return base64 payloads; this module decodes them and works out
//! the image format so callers can save or serve the bytes.

mod http;
mod openai;

pub use self::http::HttpImageGenerator;
pub use self::openai::OpenAIImageGenerator;

use crate::config::{ImageProvider, ImageSettings, Prompts};
use crate::error::{Result, TubecoachError};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Trait for text-to-image backends.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image and return its raw bytes.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>>;
}

/// Build the configured image backend.
pub fn create_generator(settings: &ImageSettings) -> Result<Arc<dyn ImageGenerator>> {
    let generator: Arc<dyn ImageGenerator> = match settings.provider {
        ImageProvider::OpenAI => Arc::new(OpenAIImageGenerator::new(settings)?),
        ImageProvider::Http => Arc::new(HttpImageGenerator::new(settings)?),
    };
    Ok(generator)
}

/// Wrap an extracted design description in the configured image prompt.
pub fn illustration_prompt(template: &str, design: &str) -> String {
    let mut vars = HashMap::new();
    vars.insert("design".to_string(), design.to_string());
    Prompts::render(template, &vars)
}

/// Image container formats we can recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Gif,
    Unknown,
}

impl ImageFormat {
    /// Detect the format from magic bytes.
    pub fn sniff(bytes: &[u8]) -> Self {
        match bytes {
            [0x89, b'P', b'N', b'G', ..] => ImageFormat::Png,
            [0xFF, 0xD8, 0xFF, ..] => ImageFormat::Jpeg,
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => ImageFormat::Webp,
            [b'G', b'I', b'F', b'8', ..] => ImageFormat::Gif,
            _ => ImageFormat::Unknown,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
            ImageFormat::Gif => "gif",
            ImageFormat::Unknown => "bin",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Unknown => "application/octet-stream",
        }
    }
}

/// A generated illustration.
#[derive(Debug, Clone)]
pub struct Illustration {
    /// Prompt sent to the image backend.
    pub prompt: String,
    pub bytes: Vec<u8>,
}

impl Illustration {
    pub fn format(&self) -> ImageFormat {
        ImageFormat::sniff(&self.bytes)
    }

    /// Base64 encoding of the image bytes.
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Write the image to `dir/<stem>.<ext>` and return the path.
    pub fn save(&self, dir: &Path, stem: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.{}", stem, self.format().extension()));
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Decode a base64 image payload, accepting an optional `data:` URL prefix.
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>> {
    let data = match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    };

    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(TubecoachError::Generation("Empty image payload".to_string()));
    }

    general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| TubecoachError::Generation(format!("Invalid base64 image payload: {}", e)))
}
