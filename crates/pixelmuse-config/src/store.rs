use std::path::PathBuf;

use serde::Deserialize;

/// Local settings storage
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Settings file holding stored API keys; defaults to the platform config directory
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
}
