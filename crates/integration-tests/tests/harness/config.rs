//! Programmatic configuration builder for integration tests

use pixelmuse_config::{Config, ImageGenProviderConfig, ImageGenProviderType};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with no providers registered
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Register the `OpenAI` provider pointed at a mock backend
    pub fn with_openai_provider(self, base_url: &str) -> Self {
        self.with_provider("openai", ImageGenProviderType::Openai, base_url)
    }

    /// Register the Stability provider pointed at a mock backend
    pub fn with_stability_provider(self, base_url: &str) -> Self {
        self.with_provider("stability", ImageGenProviderType::Stability, base_url)
    }

    /// Set the model used when none is requested
    pub fn with_default_model(mut self, model: &str) -> Self {
        self.config.imagegen.default_model = Some(model.to_owned());
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }

    fn with_provider(mut self, name: &str, provider_type: ImageGenProviderType, base_url: &str) -> Self {
        self.config.imagegen.providers.insert(
            name.to_owned(),
            ImageGenProviderConfig {
                provider_type,
                base_url: Some(base_url.to_owned()),
            },
        );
        self
    }
}
