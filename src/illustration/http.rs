//! Generic JSON text-to-image endpoint.
//!
//! Posts the prompt together with dimensions, guidance scale, step count
//! and seed, and expects `{"images": ["<base64>", ...]}` back.

use super::{decode_image_payload, ImageGenerator};
use crate::config::ImageSettings;
use crate::error::{Result, TubecoachError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Serialize)]
struct TextToImageRequest<'a> {
    prompt: &'a str,
    model: &'a str,
    width: u32,
    height: u32,
    quality: &'a str,
    guidance_scale: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    num_images: u32,
}

#[derive(Debug, Deserialize)]
struct TextToImageResponse {
    #[serde(default)]
    images: Vec<String>,
}

/// Image generator for a self-hosted or third-party HTTP endpoint.
pub struct HttpImageGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    settings: ImageSettings,
}

impl HttpImageGenerator {
    pub fn new(settings: &ImageSettings) -> Result<Self> {
        let endpoint = settings.endpoint.clone().ok_or_else(|| {
            TubecoachError::Config("image.endpoint must be set for the http provider".to_string())
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| TubecoachError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: std::env::var(&settings.api_key_env)
                .ok()
                .filter(|k| !k.is_empty()),
            settings: settings.clone(),
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> TextToImageRequest<'a> {
        TextToImageRequest {
            prompt,
            model: &self.settings.model,
            width: self.settings.width,
            height: self.settings.height,
            quality: &self.settings.quality,
            guidance_scale: self.settings.guidance_scale,
            steps: self.settings.steps,
            seed: self.settings.seed,
            num_images: 1,
        }
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    #[instrument(skip(self, prompt), fields(endpoint = %self.endpoint))]
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&self.request_body(prompt));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TubecoachError::Generation(format!("Image request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TubecoachError::Generation(format!(
                "Image endpoint returned {}: {}",
                status,
                body.trim()
            )));
        }

        let body: TextToImageResponse = response
            .json()
            .await
            .map_err(|e| TubecoachError::Generation(format!("Malformed image response: {}", e)))?;

        let first = body
            .images
            .first()
            .ok_or_else(|| TubecoachError::Generation("No image in response".to_string()))?;

        let bytes = decode_image_payload(first)?;
        debug!("Decoded {} image bytes", bytes.len());
        Ok(bytes)
    }
}
