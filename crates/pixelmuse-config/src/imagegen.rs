use indexmap::IndexMap;
use serde::Deserialize;

/// Top-level image generation configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageGenConfig {
    /// Model used when none is requested; must be offered by a configured provider
    #[serde(default)]
    pub default_model: Option<String>,
    /// Providers to register, keyed by name, in registration order
    ///
    /// When empty, every built-in provider is registered with its default endpoint.
    #[serde(default)]
    pub providers: IndexMap<String, ImageGenProviderConfig>,
}

/// Configuration for a single image generation provider
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageGenProviderConfig {
    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: ImageGenProviderType,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Supported image generation providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageGenProviderType {
    /// `OpenAI` images API
    Openai,
    /// Stability AI v1 generation API
    Stability,
}
