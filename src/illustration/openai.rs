//! OpenAI images API backend.

use super::{decode_image_payload, ImageGenerator};
use crate::config::ImageSettings;
use crate::error::{Result, TubecoachError};
use crate::openai::create_client;
use async_openai::types::{
    CreateImageRequestArgs, Image, ImageModel, ImageQuality, ImageResponseFormat, ImageSize,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Image generator backed by the OpenAI images API.
pub struct OpenAIImageGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    size: ImageSize,
    quality: Option<ImageQuality>,
}

impl OpenAIImageGenerator {
    pub fn new(settings: &ImageSettings) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: settings.model.clone(),
            size: image_size(settings.width, settings.height)?,
            quality: match settings.quality.to_lowercase().as_str() {
                "hd" => Some(ImageQuality::HD),
                "standard" => Some(ImageQuality::Standard),
                _ => None,
            },
        })
    }
}

/// Map configured dimensions onto the sizes the API accepts.
fn image_size(width: u32, height: u32) -> Result<ImageSize> {
    match (width, height) {
        (256, 256) => Ok(ImageSize::S256x256),
        (512, 512) => Ok(ImageSize::S512x512),
        (1024, 1024) => Ok(ImageSize::S1024x1024),
        (1792, 1024) => Ok(ImageSize::S1792x1024),
        (1024, 1792) => Ok(ImageSize::S1024x1792),
        _ => Err(TubecoachError::Config(format!(
            "Image size {}x{} is not supported by the OpenAI images API",
            width, height
        ))),
    }
}

fn image_model(model: &str) -> ImageModel {
    match model {
        "dall-e-2" => ImageModel::DallE2,
        "dall-e-3" => ImageModel::DallE3,
        other => ImageModel::Other(other.to_string()),
    }
}

#[async_trait]
impl ImageGenerator for OpenAIImageGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        let mut builder = CreateImageRequestArgs::default();
        builder
            .prompt(prompt)
            .model(image_model(&self.model))
            .n(1)
            .size(self.size.clone())
            .response_format(ImageResponseFormat::B64Json);

        // Quality is only understood by dall-e-3
        if self.model == "dall-e-3" {
            if let Some(quality) = &self.quality {
                builder.quality(quality.clone());
            }
        }

        let request = builder
            .build()
            .map_err(|e| TubecoachError::Generation(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .images()
            .create(request)
            .await
            .map_err(|e| TubecoachError::Generation(format!("Images API error: {}", e)))?;

        let image = response
            .data
            .first()
            .ok_or_else(|| TubecoachError::Generation("No image in response".to_string()))?;

        match &**image {
            Image::B64Json { b64_json, .. } => {
                let bytes = decode_image_payload(b64_json.as_str())?;
                debug!("Decoded {} image bytes", bytes.len());
                Ok(bytes)
            }
            Image::Url { .. } => Err(TubecoachError::Generation(
                "Expected a base64 image but received a URL".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_sizes() {
        assert!(matches!(image_size(1024, 1024), Ok(ImageSize::S1024x1024)));
        assert!(matches!(image_size(1792, 1024), Ok(ImageSize::S1792x1024)));
        assert!(image_size(1000, 1000).is_err());
    }

    #[test]
    fn test_image_model_mapping() {
        assert!(matches!(image_model("dall-e-3"), ImageModel::DallE3));
        assert!(matches!(image_model("gpt-image-1"), ImageModel::Other(ref m) if m == "gpt-image-1"));
    }
}
