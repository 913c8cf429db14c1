use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from the settings store and the image saver
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not a JSON object
    #[error("settings file {path} is malformed: {message}")]
    Malformed { path: PathBuf, message: String },

    /// No platform configuration directory could be determined
    #[error("could not determine a configuration directory; set store.settings_path")]
    NoConfigDir,

    /// Every numbered variant of a file name is already taken
    #[error("no free file name for {stem} in {dir}")]
    NameExhausted { dir: PathBuf, stem: String },

    /// Fetching a remote image failed
    #[error("failed to download image: {0}")]
    Download(String),

    /// Inline image data is not valid base64
    #[error("invalid inline image data: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
