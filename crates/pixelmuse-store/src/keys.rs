use pixelmuse_imagegen::Credentials;
use secrecy::{ExposeSecret, SecretString};

use crate::{error::Result, settings::SettingsStore};

/// API keys kept in the settings file, one entry per provider
#[derive(Debug)]
pub struct ApiKeyStore {
    settings: SettingsStore,
}

impl ApiKeyStore {
    pub fn new(settings: SettingsStore) -> Self {
        Self { settings }
    }

    /// Settings key under which a provider's API key is stored
    pub fn storage_key(provider: &str) -> String {
        format!("{}-api-key", provider.to_lowercase())
    }

    /// Stored key for `provider`; an empty entry counts as unset
    pub fn get(&self, provider: &str) -> Option<SecretString> {
        self.settings
            .get_str(&Self::storage_key(provider))
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(SecretString::from)
    }

    pub fn set(&mut self, provider: &str, key: &SecretString) -> Result<()> {
        tracing::debug!(provider, "storing API key");
        self.settings
            .set(Self::storage_key(provider), key.expose_secret().trim())
    }

    /// Forget the key for `provider`; returns whether one was stored
    pub fn remove(&mut self, provider: &str) -> Result<bool> {
        self.settings.delete(&Self::storage_key(provider))
    }

    /// Credential mapping for the given providers, skipping unset ones
    pub fn credentials<'a>(&self, providers: impl IntoIterator<Item = &'a str>) -> Credentials {
        providers
            .into_iter()
            .filter_map(|provider| self.get(provider).map(|key| (provider.to_owned(), key)))
            .collect()
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }
}
