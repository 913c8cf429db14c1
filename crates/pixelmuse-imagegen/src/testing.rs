//! In-process provider double for unit tests

use std::{
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    descriptor::{Choice, ModelSpec, OptionSchema, SizeChoice},
    error::AdapterError,
    provider::{ImageGenProvider, ImageRequest, ProviderImage, ProviderResponse},
    types::{ImageRef, ImageSize},
};

pub(crate) const MOCK_MODELS: &[ModelSpec] = &[
    ModelSpec {
        id: "mock-square",
        display_name: "Mock Square",
        description: "Square images from the mock provider",
        upstream_model: "mock-square-v1",
        default_size: ImageSize::new(512, 512),
        supported_sizes: &[
            SizeChoice::new(512, 512, "512×512"),
            SizeChoice::new(1024, 1024, "1024×1024"),
            SizeChoice::auto("Auto"),
        ],
        extra_options: &[
            OptionSchema::choices("style", &[Choice::new("vivid", "Vivid"), Choice::new("natural", "Natural")]),
            OptionSchema::range("strength", 1, 10),
        ],
    },
    ModelSpec {
        id: "mock-wide",
        display_name: "Mock Wide",
        description: "Wide images from the mock provider",
        upstream_model: "mock-wide-v1",
        default_size: ImageSize::new(1536, 1024),
        supported_sizes: &[SizeChoice::new(1536, 1024, "1536×1024")],
        extra_options: &[],
    },
];

pub(crate) const OTHER_MODELS: &[ModelSpec] = &[ModelSpec {
    id: "other-model",
    display_name: "Other",
    description: "Model from a second provider",
    upstream_model: "other-v2",
    default_size: ImageSize::new(768, 768),
    supported_sizes: &[SizeChoice::new(768, 768, "768×768")],
    extra_options: &[],
}];

/// Scripted provider
///
/// Prompts are interpreted as instructions: a leading `sleep:<ms>` delays
/// the answer and any prompt containing `fail` is rejected as rate limited.
/// Successful images carry the prompt as their payload.
pub(crate) struct MockProvider {
    name: &'static str,
    models: &'static [ModelSpec],
    images: usize,
    calls: AtomicUsize,
    requests: Mutex<Vec<ImageRequest>>,
}

impl MockProvider {
    pub(crate) fn new(name: &'static str, models: &'static [ModelSpec]) -> Self {
        Self {
            name,
            models,
            images: 1,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Provider that answers successfully with no images
    pub(crate) fn empty(name: &'static str, models: &'static [ModelSpec]) -> Self {
        Self::with_images(name, models, 0)
    }

    /// Provider answering with `images` images per call; the first carries
    /// the prompt as payload, later ones `<prompt>#<n>`
    pub(crate) fn with_images(name: &'static str, models: &'static [ModelSpec], images: usize) -> Self {
        Self {
            images,
            ..Self::new(name, models)
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<ImageRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ImageGenProvider for MockProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn models(&self) -> &'static [ModelSpec] {
        self.models
    }

    async fn generate(&self, request: &ImageRequest) -> Result<ProviderResponse, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(ms) = request
            .prompt
            .strip_prefix("sleep:")
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|ms| ms.parse::<u64>().ok())
        {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        if request.prompt.contains("fail") {
            return Err(AdapterError::RateLimited("mock quota exhausted".to_owned()));
        }

        let (width, height) = request.size.dimensions().unwrap_or((1024, 1024));
        let images = (0..self.images)
            .map(|i| {
                let payload = if i == 0 {
                    request.prompt.clone()
                } else {
                    format!("{}#{}", request.prompt, i + 1)
                };

                ProviderImage {
                    image: ImageRef::inline("image/png", payload.clone()),
                    width,
                    height,
                    revised_prompt: Some(format!("revised: {payload}")),
                }
            })
            .collect();

        Ok(ProviderResponse {
            images,
            model: request.model.to_owned(),
            provider: self.name.to_owned(),
        })
    }
}
