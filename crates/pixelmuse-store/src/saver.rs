use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use base64::{Engine, engine::general_purpose::STANDARD};
use jiff::Timestamp;
use pixelmuse_imagegen::ImageRef;
use reqwest::Client;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

use crate::error::{Result, StoreError};

/// Hosted images can be large and slow to serve
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Numbered variants tried before giving up on a file name
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Writes generated images to disk
#[derive(Debug, Clone)]
pub struct ImageSaver {
    client: Client,
}

impl ImageSaver {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DOWNLOAD_TIMEOUT)
    }

    /// Saver whose downloads give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(15).min(timeout))
            .build()
            .map_err(|e| StoreError::Download(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Persist `image` as `<dir>/<file_stem>.<ext>` and return the written path
    ///
    /// Inline images are decoded; remote images are downloaded first. An
    /// existing file is never replaced: the name gets a `-2`, `-3`, ...
    /// suffix instead.
    pub async fn save(&self, image: &ImageRef, dir: &Path, file_stem: &str) -> Result<PathBuf> {
        let bytes = self.fetch(image).await?;

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| StoreError::io(dir, e))?;

        let path = write_new(dir, file_stem, image.extension(), &bytes).await?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "saved image");

        Ok(path)
    }

    async fn fetch(&self, image: &ImageRef) -> Result<Vec<u8>> {
        match image {
            ImageRef::Inline { data, .. } => decode_inline(data),
            ImageRef::Url { url } => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(|e| StoreError::Download(e.to_string()))?;

                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| StoreError::Download(e.to_string()))?;

                Ok(bytes.to_vec())
            }
        }
    }
}

/// Create a file that did not exist before and write `bytes` into it
async fn write_new(dir: &Path, stem: &str, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let name = if attempt == 1 {
            format!("{stem}.{extension}")
        } else {
            format!("{stem}-{attempt}.{extension}")
        };
        let path = dir.join(name);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        if attempt > 1 {
            tracing::info!(path = %path.display(), "file name taken, saving under a numbered name");
        }

        file.write_all(bytes).await.map_err(|e| StoreError::io(&path, e))?;
        file.flush().await.map_err(|e| StoreError::io(&path, e))?;

        return Ok(path);
    }

    Err(StoreError::NameExhausted {
        dir: dir.to_path_buf(),
        stem: stem.to_owned(),
    })
}

/// Decode base64 image data, tolerating a `data:<type>;base64,` prefix
fn decode_inline(data: &str) -> Result<Vec<u8>> {
    let payload = data
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map_or(data, |(_, payload)| payload);

    Ok(STANDARD.decode(payload.trim())?)
}

/// Default file name stem for an image without a requested name
///
/// First five words of the prompt, lowercased and reduced to `[a-z0-9-]`,
/// followed by the model and a filesystem-safe timestamp.
pub fn default_file_stem(prompt: &str, model: &str, at: Timestamp) -> String {
    let words = prompt
        .split(' ')
        .take(5)
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect::<String>();

    let stamp = at.to_string().replace([':', '.'], "-");

    format!("{words}-{model}-{stamp}")
}
