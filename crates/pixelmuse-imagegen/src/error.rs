use strum::{AsRefStr, Display};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Errors surfaced by the generator, per call or per batch item
#[derive(Debug, Error)]
pub enum ImageGenError {
    /// Empty prompt, unsupported size or option value, or an empty batch
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No model with this id is registered
    #[error("Model '{0}' not found")]
    ModelNotFound(String),

    /// The provider backing the model has no usable credential
    #[error("Missing API key for {provider}")]
    MissingCredential { provider: String },

    /// The provider answered successfully but returned no image
    #[error("No image was generated by {model}")]
    EmptyResult { model: String },

    /// The provider adapter failed
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl ImageGenError {
    /// Adapter failure classification, if this error came from a provider
    pub fn adapter_kind(&self) -> Option<AdapterErrorKind> {
        match self {
            Self::Adapter(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Coarse classification of adapter failures used to pick user guidance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AdapterErrorKind {
    /// Invalid or expired credential
    Authentication,
    /// Rate limit or quota exhausted
    RateLimit,
    /// Anything else
    Generic,
}

/// Failures reported by provider adapters
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The provider rejected the credential
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The provider throttled the request or the account is out of quota
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The provider rejected the request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Provider API returned an error
    #[error("Provider API error ({status}): {message}")]
    ProviderApiError { status: u16, message: String },

    /// Network or connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The response body could not be decoded
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl AdapterError {
    pub fn kind(&self) -> AdapterErrorKind {
        match self {
            Self::AuthenticationFailed(_) => AdapterErrorKind::Authentication,
            Self::RateLimited(_) => AdapterErrorKind::RateLimit,
            Self::InvalidRequest(_)
            | Self::ProviderApiError { .. }
            | Self::ConnectionError(_)
            | Self::InvalidResponse(_) => AdapterErrorKind::Generic,
        }
    }

    /// Classify a non-success HTTP response from a provider
    ///
    /// Some providers report quota exhaustion with a 400 or 403 and only
    /// say so in the body, so the text is inspected before the status.
    pub fn from_status(status: u16, body: String) -> Self {
        if looks_rate_limited(&body) || status == 429 {
            return Self::RateLimited(body);
        }

        match status {
            401 | 403 => Self::AuthenticationFailed(body),
            400 => Self::InvalidRequest(body),
            _ => Self::ProviderApiError { status, message: body },
        }
    }
}

fn looks_rate_limited(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    ["rate limit", "rate_limit", "quota", "capacity"]
        .iter()
        .any(|needle| lower.contains(needle))
}

/// Errors raised while assembling the model registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two providers declared the same model id
    #[error("model id '{id}' is declared by both '{first}' and '{second}'")]
    DuplicateModel { id: String, first: String, second: String },

    /// The configured default model is not registered
    #[error("default model '{0}' is not registered")]
    UnknownDefault(String),
}
