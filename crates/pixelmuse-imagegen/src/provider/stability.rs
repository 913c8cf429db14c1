use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use super::{ImageGenProvider, ImageRequest, ProviderImage, ProviderResponse};
use crate::{
    descriptor::{ModelSpec, SizeChoice},
    error::AdapterError,
    http_client::http_client,
    types::{ImageRef, ImageSize},
};

/// Default Stability AI API base URL
const DEFAULT_BASE_URL: &str = "https://api.stability.ai/v1";

pub const PROVIDER_NAME: &str = "Stability AI";

const CFG_SCALE: f32 = 7.0;

const MODELS: &[ModelSpec] = &[
    ModelSpec {
        id: "stable-diffusion-xl",
        display_name: "Stable Diffusion XL",
        description: "Stability AI's SDXL 1.0 model for high-quality image generation",
        upstream_model: "stable-diffusion-xl-1024-v1-0",
        default_size: ImageSize::new(1024, 1024),
        supported_sizes: &[
            SizeChoice::new(512, 512, "512×512"),
            SizeChoice::new(768, 768, "768×768"),
            SizeChoice::new(1024, 1024, "1024×1024"),
            SizeChoice::new(1152, 896, "1152×896"),
        ],
        extra_options: &[],
    },
    ModelSpec {
        id: "stable-diffusion-3",
        display_name: "Stable Diffusion 3",
        description: "Stability AI's latest SD3 model for state-of-the-art image generation",
        upstream_model: "stable-diffusion-3",
        default_size: ImageSize::new(1024, 1024),
        supported_sizes: &[
            SizeChoice::new(1024, 1024, "1024×1024"),
            SizeChoice::new(1536, 1024, "1536×1024 (Wide)"),
            SizeChoice::new(1024, 1536, "1024×1536 (Tall)"),
            SizeChoice::new(1344, 768, "1344×768"),
        ],
        extra_options: &[],
    },
];

/// Stability AI text-to-image provider
pub struct StabilityImageGenProvider {
    client: Client,
    base_url: String,
}

impl StabilityImageGenProvider {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            client: http_client(),
            base_url,
        }
    }

    /// Sampling steps and style preset for an engine
    fn tuning(engine: &str) -> (u32, Option<&'static str>) {
        if engine == "stable-diffusion-3" {
            (40, Some("photographic"))
        } else {
            (30, None)
        }
    }
}

#[derive(Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
}

/// Wire format for the Stability text-to-image request
#[derive(Serialize)]
struct StabilityRequest<'a> {
    text_prompts: [TextPrompt<'a>; 1],
    cfg_scale: f32,
    height: u32,
    width: u32,
    samples: u32,
    steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    style_preset: Option<&'static str>,
}

#[derive(Deserialize)]
struct StabilityResponse {
    #[serde(default)]
    artifacts: Vec<StabilityArtifact>,
}

#[derive(Deserialize)]
struct StabilityArtifact {
    base64: String,
    width: Option<u32>,
    height: Option<u32>,
}

#[async_trait]
impl ImageGenProvider for StabilityImageGenProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn models(&self) -> &'static [ModelSpec] {
        MODELS
    }

    async fn generate(&self, request: &ImageRequest) -> Result<ProviderResponse, AdapterError> {
        let Some((width, height)) = request.size.dimensions() else {
            return Err(AdapterError::InvalidRequest(
                "Stability AI requires explicit image dimensions".to_string(),
            ));
        };

        let url = format!(
            "{}/generation/{}/text-to-image",
            self.base_url.trim_end_matches('/'),
            request.model
        );
        let (steps, style_preset) = Self::tuning(request.model);

        let body = StabilityRequest {
            text_prompts: [TextPrompt { text: &request.prompt }],
            cfg_scale: CFG_SCALE,
            height,
            width,
            samples: request.n,
            steps,
            style_preset,
        };

        tracing::debug!(
            provider = PROVIDER_NAME,
            model = request.model,
            width,
            height,
            steps,
            "sending text-to-image request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(request.credential.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(provider = PROVIDER_NAME, error = %e, "text-to-image request failed");
                AdapterError::ConnectionError(format!("Failed to send request to Stability AI: {e}"))
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

            tracing::error!(
                provider = PROVIDER_NAME,
                model = request.model,
                status = %status,
                "Stability API error"
            );

            return Err(AdapterError::from_status(status.as_u16(), error_text));
        }

        let wire_response: StabilityResponse = response.json().await.map_err(|e| {
            tracing::error!(provider = PROVIDER_NAME, error = %e, "failed to parse Stability response");
            AdapterError::InvalidResponse(e.to_string())
        })?;

        let images = wire_response
            .artifacts
            .into_iter()
            .map(|artifact| ProviderImage {
                image: ImageRef::inline("image/png", artifact.base64),
                width: artifact.width.unwrap_or(width),
                height: artifact.height.unwrap_or(height),
                revised_prompt: None,
            })
            .collect();

        Ok(ProviderResponse {
            images,
            model: request.model.to_string(),
            provider: PROVIDER_NAME.to_string(),
        })
    }
}
