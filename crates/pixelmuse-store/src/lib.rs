//! Local persistence for `PixelMuse`
//!
//! A flat JSON settings file holding per-provider API keys, and the
//! image saver that writes generated images to disk.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod keys;
mod saver;
mod settings;

pub use error::{Result, StoreError};
pub use keys::ApiKeyStore;
pub use saver::{ImageSaver, default_file_stem};
pub use settings::SettingsStore;
