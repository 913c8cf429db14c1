#![allow(clippy::must_use_candidate)]

mod env;
pub mod imagegen;
mod loader;
pub mod log;
pub mod store;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;

pub use imagegen::*;
pub use log::*;
pub use store::*;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "pixelmuse.toml";

/// Top-level `PixelMuse` configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Image generation providers and default model
    #[serde(default)]
    pub imagegen: ImageGenConfig,
    /// Settings store location
    #[serde(default)]
    pub store: StoreConfig,
    /// API keys keyed by provider name; override keys from the settings store
    #[serde(default)]
    pub credentials: IndexMap<String, SecretString>,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}
