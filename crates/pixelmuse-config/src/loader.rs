use std::{collections::HashSet, path::Path};

use url::Url;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`] for a file that exists
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if provider endpoints are malformed, a provider type
    /// is configured twice, or the default model is blank
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_providers()?;
        self.validate_default_model()?;
        Ok(())
    }

    fn validate_providers(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();

        for (name, provider) in &self.imagegen.providers {
            if !seen.insert(provider.provider_type) {
                anyhow::bail!(
                    "image generation provider '{name}' repeats type {:?}; each provider type may be configured once",
                    provider.provider_type
                );
            }

            if let Some(ref base_url) = provider.base_url {
                let url = Url::parse(base_url)
                    .map_err(|e| anyhow::anyhow!("invalid base_url for provider '{name}': {e}"))?;

                if !matches!(url.scheme(), "http" | "https") {
                    anyhow::bail!("base_url for provider '{name}' must use http or https");
                }
            }
        }

        Ok(())
    }

    fn validate_default_model(&self) -> anyhow::Result<()> {
        if self
            .imagegen
            .default_model
            .as_deref()
            .is_some_and(|m| m.trim().is_empty())
        {
            anyhow::bail!("imagegen.default_model must not be empty");
        }

        Ok(())
    }
}
