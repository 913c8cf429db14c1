#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

pub mod credentials;
mod descriptor;
mod error;
mod generator;
mod http_client;
mod prompt;
pub mod provider;
mod registry;
#[cfg(test)]
mod testing;
mod types;

use std::sync::Arc;

use pixelmuse_config::{ImageGenProviderConfig, ImageGenProviderType};

pub use credentials::Credentials;
pub use descriptor::{Choice, ModelDescriptor, ModelSpec, OptionSchema, OptionValues, SizeChoice};
pub use error::{AdapterError, AdapterErrorKind, ImageGenError, RegistryError, Result};
pub use generator::Generator;
pub use prompt::PromptLine;
pub use provider::{ImageGenProvider, ImageRequest, ProviderImage, ProviderResponse};
pub use registry::{DEFAULT_MODEL, ModelRegistry, ModelRegistryBuilder};
pub use types::{
    BatchOutcome, BatchProgress, ExtraOptions, GenerationParams, GenerationResult, ImageRef, ImageSize,
    ParseSizeError,
};

use provider::{OpenAiImageGenProvider, StabilityImageGenProvider};

/// Build the model registry from configuration
///
/// With no providers configured every built-in provider is registered
/// against its public endpoint.
///
/// # Errors
///
/// Returns an error if two providers declare the same model or the
/// default model is not offered by any registered provider
pub fn build_registry(config: &pixelmuse_config::Config) -> anyhow::Result<Arc<ModelRegistry>> {
    let mut builder = ModelRegistry::builder();

    if config.imagegen.providers.is_empty() {
        builder = builder
            .provider(Arc::new(OpenAiImageGenProvider::new(None)))
            .provider(Arc::new(StabilityImageGenProvider::new(None)));
    } else {
        for (name, provider_config) in &config.imagegen.providers {
            tracing::debug!("Initializing image generation provider: {name}");
            builder = builder.provider(provider_from_config(provider_config));
        }
    }

    if let Some(ref default_model) = config.imagegen.default_model {
        builder = builder.default_model(default_model.clone());
    }

    let registry = builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to initialize model registry: {e}"))?;

    Ok(Arc::new(registry))
}

fn provider_from_config(config: &ImageGenProviderConfig) -> Arc<dyn ImageGenProvider> {
    match config.provider_type {
        ImageGenProviderType::Openai => Arc::new(OpenAiImageGenProvider::new(config.base_url.clone())),
        ImageGenProviderType::Stability => Arc::new(StabilityImageGenProvider::new(config.base_url.clone())),
    }
}
