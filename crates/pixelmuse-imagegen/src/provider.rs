pub(crate) mod openai;
pub(crate) mod stability;

use async_trait::async_trait;
use secrecy::SecretString;

pub use openai::OpenAiImageGenProvider;
pub use stability::StabilityImageGenProvider;

use crate::{
    descriptor::ModelSpec,
    error::AdapterError,
    types::{ExtraOptions, ImageRef, ImageSize},
};

/// Trait for image generation provider implementations
///
/// A provider owns the wire format of one vendor and publishes the models it
/// can serve. Registering a provider with the registry is all it takes to
/// make its models available to the generator.
#[async_trait]
pub trait ImageGenProvider: Send + Sync {
    /// Provider name, used to group models and to look up credentials
    fn name(&self) -> &str;

    /// Models served by this provider, in presentation order
    fn models(&self) -> &'static [ModelSpec];

    /// Generate images for a validated request
    async fn generate(&self, request: &ImageRequest) -> Result<ProviderResponse, AdapterError>;
}

/// Validated request handed to a provider
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub credential: SecretString,
    /// Upstream model identifier
    pub model: &'static str,
    pub prompt: String,
    pub size: ImageSize,
    /// Images per call; the generator always asks for one
    pub n: u32,
    /// Only options declared by the model, with legal values
    pub options: ExtraOptions,
}

impl ImageRequest {
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }
}

/// Raw provider answer before the generator normalizes it
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub images: Vec<ProviderImage>,
    /// Model echo as reported by the provider
    pub model: String,
    pub provider: String,
}

#[derive(Debug, Clone)]
pub struct ProviderImage {
    pub image: ImageRef,
    pub width: u32,
    pub height: u32,
    pub revised_prompt: Option<String>,
}

/// Pixel dimensions to report for a requested size
///
/// Providers that pick the size themselves do not echo it back, so `auto`
/// is reported as the square default.
pub(crate) fn reported_dimensions(size: ImageSize) -> (u32, u32) {
    size.dimensions().unwrap_or((1024, 1024))
}
