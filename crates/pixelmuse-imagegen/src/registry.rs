//! Catalog of every model offered by the registered providers

use std::sync::Arc;

use indexmap::IndexMap;
use secrecy::SecretString;

use crate::{
    credentials::{self, Credentials},
    descriptor::ModelDescriptor,
    error::{ImageGenError, RegistryError, Result},
    provider::ImageGenProvider,
};

/// Model selected when the caller does not pick one
pub const DEFAULT_MODEL: &str = "gpt-image-1";

/// Read-only model catalog, built once at startup
#[derive(Debug)]
pub struct ModelRegistry {
    models: IndexMap<&'static str, ModelDescriptor>,
    default_index: usize,
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    /// Every model keyed by id, in declaration order
    pub fn all_models(&self) -> &IndexMap<&'static str, ModelDescriptor> {
        &self.models
    }

    /// Models grouped by provider; both levels keep declaration order
    pub fn providers(&self) -> IndexMap<&str, Vec<&ModelDescriptor>> {
        let mut groups: IndexMap<&str, Vec<&ModelDescriptor>> = IndexMap::new();

        for model in self.models.values() {
            groups.entry(model.provider()).or_default().push(model);
        }

        groups
    }

    /// Registered provider name matching `name`, ignoring ASCII case
    pub fn provider_name(&self, name: &str) -> Option<&str> {
        let name = name.trim();

        self.models
            .values()
            .map(ModelDescriptor::provider)
            .find(|provider| provider.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, model_id: &str) -> Result<&ModelDescriptor> {
        self.models
            .get(model_id)
            .ok_or_else(|| ImageGenError::ModelNotFound(model_id.to_owned()))
    }

    pub fn default_model(&self) -> &ModelDescriptor {
        // Checked by the builder
        &self.models[self.default_index]
    }

    /// Credential for the provider behind `model_id`
    pub fn resolve_credential<'a>(&self, model_id: &str, credentials: &'a Credentials) -> Result<&'a SecretString> {
        credentials::resolve(self.get(model_id)?, credentials)
    }
}

/// Builder collecting providers into a [`ModelRegistry`]
pub struct ModelRegistryBuilder {
    providers: Vec<Arc<dyn ImageGenProvider>>,
    default_model: String,
}

impl Default for ModelRegistryBuilder {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            default_model: DEFAULT_MODEL.to_owned(),
        }
    }
}

impl ModelRegistryBuilder {
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn ImageGenProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    #[must_use]
    pub fn default_model(mut self, model_id: impl Into<String>) -> Self {
        self.default_model = model_id.into();
        self
    }

    /// Assemble the catalog
    ///
    /// # Errors
    ///
    /// Fails if two providers declare the same model id or if the default
    /// model is not among the registered ones.
    pub fn build(self) -> std::result::Result<ModelRegistry, RegistryError> {
        let mut models: IndexMap<&'static str, ModelDescriptor> = IndexMap::new();

        for provider in self.providers {
            tracing::debug!(provider = provider.name(), models = provider.models().len(), "registering provider");

            for spec in provider.models() {
                if let Some(existing) = models.get(spec.id) {
                    return Err(RegistryError::DuplicateModel {
                        id: spec.id.to_owned(),
                        first: existing.provider().to_owned(),
                        second: provider.name().to_owned(),
                    });
                }

                models.insert(spec.id, ModelDescriptor::new(*spec, Arc::clone(&provider)));
            }
        }

        let default_index = models
            .get_index_of(self.default_model.as_str())
            .ok_or(RegistryError::UnknownDefault(self.default_model))?;

        tracing::debug!("model registry initialized with {} model(s)", models.len());

        Ok(ModelRegistry { models, default_index })
    }
}
