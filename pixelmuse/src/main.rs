#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;
mod commands;
mod render;

use args::{Args, Command};
use clap::Parser;
use pixelmuse_config::{Config, DEFAULT_CONFIG_FILE};
use anyhow::Context as _;
use pixelmuse_imagegen::{Credentials, Generator, ModelRegistry};
use pixelmuse_store::{ApiKeyStore, ImageSaver, SettingsStore};

/// Everything a command needs, assembled once at startup
pub struct App {
    pub config: Config,
    pub generator: Generator,
    pub keys: ApiKeyStore,
    pub saver: ImageSaver,
}

impl App {
    /// Stored keys for every registered provider, overlaid by keys from the config file
    ///
    /// Provider names in the config file are matched ignoring case.
    pub fn credentials(&self) -> anyhow::Result<Credentials> {
        let registry = self.generator.registry();
        let mut credentials = self.keys.credentials(registry.providers().keys().copied());

        let configured = self
            .config
            .credentials
            .iter()
            .map(|(provider, key)| {
                canonical_provider(registry, provider)
                    .map(|provider| (provider, key.clone()))
                    .context("invalid [credentials] entry in config")
            })
            .collect::<anyhow::Result<Credentials>>()?;

        credentials.merge(configured);

        Ok(credentials)
    }
}

/// Provider name as registered, matched case-insensitively
pub fn canonical_provider(registry: &ModelRegistry, name: &str) -> anyhow::Result<String> {
    registry.provider_name(name).map(str::to_owned).with_context(|| {
        let known = registry.providers().keys().copied().collect::<Vec<_>>().join(", ");
        format!("unknown provider '{name}', expected one of: {known}")
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // An explicit config path must exist; the default one is optional
    let config = if args.config.as_os_str() == DEFAULT_CONFIG_FILE {
        Config::load_or_default(&args.config)?
    } else {
        Config::load(&args.config)?
    };

    pixelmuse_telemetry::init(&config.log, args.verbose)?;

    tracing::debug!(config_path = %args.config.display(), "starting pixelmuse");

    let registry = pixelmuse_imagegen::build_registry(&config)?;

    let settings_path = match &config.store.settings_path {
        Some(path) => path.clone(),
        None => SettingsStore::default_path()?,
    };

    let mut app = App {
        keys: ApiKeyStore::new(SettingsStore::open(settings_path)?),
        generator: Generator::new(registry),
        saver: ImageSaver::new()?,
        config,
    };

    match args.command {
        Command::Models => {
            commands::models(&app);
            Ok(())
        }
        Command::Keys { action } => commands::keys(&mut app, action),
        Command::Generate(generate) => commands::generate(&app, generate).await,
        Command::Batch(batch) => commands::batch(&app, &batch).await,
    }
}
