use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use jiff::Timestamp;
use serde::Serialize;
use thiserror::Error;

use crate::error::ImageGenError;

/// Requested output size, parsed from the `WxH` / `auto` notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSize {
    /// Let the provider pick
    Auto,
    /// Fixed pixel dimensions
    Fixed { width: u32, height: u32 },
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self::Fixed { width, height }
    }

    /// Pixel dimensions, or `None` for `auto`
    pub const fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            Self::Auto => None,
            Self::Fixed { width, height } => Some((width, height)),
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Fixed { width, height } => write!(f, "{width}x{height}"),
        }
    }
}

impl Serialize for ImageSize {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Error)]
#[error("invalid image size '{0}', expected WIDTHxHEIGHT or auto")]
pub struct ParseSizeError(String);

impl FromStr for ImageSize {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }

        let (width, height) = trimmed
            .split_once(['x', 'X'])
            .ok_or_else(|| ParseSizeError(s.to_owned()))?;

        match (width.parse::<u32>(), height.parse::<u32>()) {
            (Ok(width), Ok(height)) if width > 0 && height > 0 => Ok(Self::new(width, height)),
            _ => Err(ParseSizeError(s.to_owned())),
        }
    }
}

/// A generated image, either fetchable or embedded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageRef {
    /// Remote URL hosted by the provider
    Url { url: String },
    /// Base64 payload with its media type (e.g. `image/png`)
    Inline { media_type: String, data: String },
}

impl ImageRef {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    pub fn inline(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Inline {
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    pub const fn is_inline(&self) -> bool {
        matches!(self, Self::Inline { .. })
    }

    /// Render as something a browser or viewer can open directly
    pub fn to_uri(&self) -> String {
        match self {
            Self::Url { url } => url.clone(),
            Self::Inline { media_type, data } => format!("data:{media_type};base64,{data}"),
        }
    }

    /// File extension matching the payload; remote images are assumed PNG
    pub fn extension(&self) -> &str {
        match self {
            Self::Url { .. } => "png",
            Self::Inline { media_type, .. } => match media_type.rsplit_once('/') {
                Some((_, "jpeg")) => "jpg",
                Some((_, subtype)) if !subtype.is_empty() => subtype,
                _ => "png",
            },
        }
    }
}

/// Extra per-model options keyed by option name, in caller order
pub type ExtraOptions = IndexMap<String, String>;

/// Everything about a generation call except the prompt
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    pub model_id: String,
    /// `WxH` or `auto`; `None` selects the model default
    pub size: Option<String>,
    pub extra_options: ExtraOptions,
}

impl GenerationParams {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    #[must_use]
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_options.insert(name.into(), value.into());
        self
    }
}

/// Normalized outcome of one successful unit of work
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub image: ImageRef,
    pub width: u32,
    pub height: u32,
    pub model: String,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
    pub generated_at: Timestamp,
}

impl GenerationResult {
    pub const fn is_inline(&self) -> bool {
        self.image.is_inline()
    }
}

/// Outcome of one batch item, at the index of its prompt
#[derive(Debug)]
pub enum BatchOutcome {
    Success {
        result: GenerationResult,
        /// The line as the caller wrote it, directive included
        original_prompt: String,
        /// The prompt actually sent, directive stripped
        display_prompt: String,
        /// File name requested through a `#$name` directive
        suggested_name: Option<String>,
    },
    Failure {
        original_prompt: String,
        error: ImageGenError,
    },
}

impl BatchOutcome {
    pub fn original_prompt(&self) -> &str {
        match self {
            Self::Success { original_prompt, .. } | Self::Failure { original_prompt, .. } => original_prompt,
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub const fn result(&self) -> Option<&GenerationResult> {
        match self {
            Self::Success { result, .. } => Some(result),
            Self::Failure { .. } => None,
        }
    }

    pub const fn error(&self) -> Option<&ImageGenError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

/// Running completion count for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}
