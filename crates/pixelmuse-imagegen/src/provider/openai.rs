use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use super::{ImageGenProvider, ImageRequest, ProviderImage, ProviderResponse, reported_dimensions};
use crate::{
    descriptor::{Choice, ModelSpec, OptionSchema, SizeChoice},
    error::AdapterError,
    http_client::http_client,
    types::{ExtraOptions, ImageRef, ImageSize},
};

/// Default `OpenAI` API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub const PROVIDER_NAME: &str = "OpenAI";

const SIZES: &[SizeChoice] = &[
    SizeChoice::new(1024, 1024, "1024×1024 (Square)"),
    SizeChoice::new(1024, 1536, "1024×1536 (Tall)"),
    SizeChoice::new(1536, 1024, "1536×1024 (Wide)"),
    SizeChoice::auto("Auto"),
];

const GPT_IMAGE_OPTIONS: &[OptionSchema] = &[
    OptionSchema::choices(
        "background",
        &[
            Choice::new("auto", "Auto (Default)"),
            Choice::new("transparent", "Transparent"),
            Choice::new("opaque", "Opaque"),
        ],
    ),
    OptionSchema::choices(
        "moderation",
        &[
            Choice::new("auto", "Auto (Default)"),
            Choice::new("low", "Low (Less restrictive)"),
        ],
    ),
    OptionSchema::choices(
        "output_format",
        &[
            Choice::new("png", "PNG (Default)"),
            Choice::new("jpeg", "JPEG"),
            Choice::new("webp", "WebP"),
        ],
    ),
    // Percent; only meaningful for jpeg and webp output
    OptionSchema::range("output_compression", 1, 100),
    OptionSchema::choices(
        "quality",
        &[
            Choice::new("auto", "Auto (Default)"),
            Choice::new("high", "High"),
            Choice::new("medium", "Medium"),
            Choice::new("low", "Low"),
        ],
    ),
];

const DALLE3_OPTIONS: &[OptionSchema] = &[OptionSchema::choices(
    "quality",
    &[Choice::new("standard", "Standard (Default)"), Choice::new("hd", "HD")],
)];

const MODELS: &[ModelSpec] = &[
    ModelSpec {
        id: "gpt-image-1",
        display_name: "GPT Image 1",
        description: "OpenAI's GPT-image-1 backend for photorealistic image generation",
        upstream_model: "gpt-image-1",
        default_size: ImageSize::new(1024, 1024),
        supported_sizes: SIZES,
        extra_options: GPT_IMAGE_OPTIONS,
    },
    ModelSpec {
        id: "dall-e-3",
        display_name: "DALL-E 3",
        description: "OpenAI's DALL-E 3 model for creative image generation",
        upstream_model: "dall-e-3",
        default_size: ImageSize::new(1024, 1024),
        supported_sizes: SIZES,
        extra_options: DALLE3_OPTIONS,
    },
    ModelSpec {
        id: "dall-e-2",
        display_name: "DALL-E 2",
        description: "OpenAI's DALL-E 2 model for image generation",
        upstream_model: "dall-e-2",
        default_size: ImageSize::new(1024, 1024),
        supported_sizes: SIZES,
        extra_options: &[],
    },
];

/// `OpenAI` image generation provider
pub struct OpenAiImageGenProvider {
    client: Client,
    base_url: String,
}

impl OpenAiImageGenProvider {
    /// Create a new `OpenAI` image generation provider
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            client: http_client(),
            base_url,
        }
    }

    /// DALL-E models can return hosted URLs; GPT image models only return base64
    fn returns_urls(model: &str) -> bool {
        model.starts_with("dall-e")
    }
}

/// Wire format for the `OpenAI` image generation API request
#[derive(Serialize)]
struct OpenAiImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'static str>,
    /// Validated model options, passed through under their wire names
    #[serde(flatten)]
    options: IndexMap<&'a str, OptionValue<'a>>,
}

/// Option value as the API expects it: range options go out as numbers
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
enum OptionValue<'a> {
    Number(u32),
    Text(&'a str),
}

fn wire_options<'a>(model: &str, options: &'a ExtraOptions) -> IndexMap<&'a str, OptionValue<'a>> {
    let numeric = |name: &str| {
        MODELS
            .iter()
            .filter(|spec| spec.upstream_model == model)
            .flat_map(|spec| spec.extra_options)
            .any(|option| option.name == name && option.is_numeric())
    };

    options
        .iter()
        .map(|(name, value)| {
            let value = match value.parse::<u32>() {
                Ok(number) if numeric(name) => OptionValue::Number(number),
                _ => OptionValue::Text(value),
            };
            (name.as_str(), value)
        })
        .collect()
}

/// Wire format for the `OpenAI` image generation API response
#[derive(Deserialize)]
struct OpenAiImageResponse {
    #[serde(default)]
    data: Vec<OpenAiImageData>,
}

#[derive(Deserialize)]
struct OpenAiImageData {
    url: Option<String>,
    b64_json: Option<String>,
    revised_prompt: Option<String>,
}

#[async_trait]
impl ImageGenProvider for OpenAiImageGenProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn models(&self) -> &'static [ModelSpec] {
        MODELS
    }

    async fn generate(&self, request: &ImageRequest) -> Result<ProviderResponse, AdapterError> {
        let url = format!("{}/images/generations", self.base_url.trim_end_matches('/'));

        let wire_request = OpenAiImageRequest {
            model: request.model,
            prompt: &request.prompt,
            n: request.n,
            size: request.size.to_string(),
            response_format: Self::returns_urls(request.model).then_some("url"),
            options: wire_options(request.model, &request.options),
        };

        tracing::debug!(
            provider = PROVIDER_NAME,
            model = request.model,
            size = %request.size,
            "sending image generation request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(request.credential.expose_secret())
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(provider = PROVIDER_NAME, error = %e, "image generation request failed");
                AdapterError::ConnectionError(format!("Failed to send request to OpenAI image generation: {e}"))
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

            tracing::error!(
                provider = PROVIDER_NAME,
                model = request.model,
                status = %status,
                "OpenAI image generation API error"
            );

            return Err(AdapterError::from_status(status.as_u16(), error_text));
        }

        let wire_response: OpenAiImageResponse = response.json().await.map_err(|e| {
            tracing::error!(
                provider = PROVIDER_NAME,
                error = %e,
                "failed to parse OpenAI image generation response"
            );
            AdapterError::InvalidResponse(e.to_string())
        })?;

        let media_type = format!("image/{}", request.option("output_format").unwrap_or("png"));
        let (width, height) = reported_dimensions(request.size);

        let images = wire_response
            .data
            .into_iter()
            .filter_map(|d| {
                let image = match (d.b64_json, d.url) {
                    (Some(data), _) => ImageRef::inline(media_type.clone(), data),
                    (None, Some(url)) => ImageRef::url(url),
                    (None, None) => return None,
                };

                Some(ProviderImage {
                    image,
                    width,
                    height,
                    revised_prompt: d.revised_prompt,
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            provider = PROVIDER_NAME,
            images = images.len(),
            "image generation request complete"
        );

        Ok(ProviderResponse {
            images,
            model: request.model.to_string(),
            provider: PROVIDER_NAME.to_string(),
        })
    }
}
