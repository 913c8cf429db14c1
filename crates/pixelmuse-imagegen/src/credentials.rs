//! Per-provider credential mapping and resolution

use std::{collections::HashMap, fmt};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::{
    descriptor::ModelDescriptor,
    error::{ImageGenError, Result},
    provider::openai,
};

/// Provider name to API key, supplied by the caller for each call
///
/// The generator only ever reads from this mapping.
#[derive(Clone, Default)]
pub struct Credentials {
    keys: HashMap<String, SecretString>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, provider: impl Into<String>, key: SecretString) {
        self.keys.insert(provider.into(), key);
    }

    #[must_use]
    pub fn with(mut self, provider: impl Into<String>, key: impl Into<String>) -> Self {
        self.insert(provider, SecretString::from(key.into()));
        self
    }

    /// Raw entry for a provider, blank or not
    pub fn get(&self, provider: &str) -> Option<&SecretString> {
        self.keys.get(provider)
    }

    /// Overlay `other` on top of this mapping, skipping blank entries
    pub fn merge(&mut self, other: Self) {
        for (provider, key) in other.keys {
            if !is_blank(&key) {
                self.keys.insert(provider, key);
            }
        }
    }

    /// Providers with a non-blank credential
    pub fn configured_providers(&self) -> impl Iterator<Item = &str> {
        self.keys
            .iter()
            .filter(|(_, key)| !is_blank(key))
            .map(|(provider, _)| provider.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.configured_providers().next().is_none()
    }
}

impl FromIterator<(String, SecretString)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (String, SecretString)>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        providers.sort_unstable();
        f.debug_struct("Credentials").field("providers", &providers).finish()
    }
}

fn is_blank(key: &SecretString) -> bool {
    key.expose_secret().trim().is_empty()
}

/// Pick the credential for the provider behind `model`
///
/// Only presence is checked; whether the key is accepted is up to the
/// provider at call time.
pub fn resolve<'a>(model: &ModelDescriptor, credentials: &'a Credentials) -> Result<&'a SecretString> {
    let provider = model.provider();

    credentials
        .get(provider)
        .filter(|key| !is_blank(key))
        .ok_or_else(|| ImageGenError::MissingCredential {
            provider: provider.to_owned(),
        })
}

#[derive(Debug, Error)]
#[error("{provider} API key should start with \"{prefix}\"")]
pub struct KeyFormatError {
    provider: String,
    prefix: &'static str,
}

/// Opportunistic syntax check for a key the user is about to store
pub fn check_key_format(provider: &str, key: &str) -> std::result::Result<(), KeyFormatError> {
    let key = key.trim();

    if provider == openai::PROVIDER_NAME && !key.is_empty() && !key.starts_with("sk-") {
        return Err(KeyFormatError {
            provider: provider.to_owned(),
            prefix: "sk-",
        });
    }

    Ok(())
}
