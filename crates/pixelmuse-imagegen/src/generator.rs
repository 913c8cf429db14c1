//! Single and batch generation over the model registry

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use futures::future::join_all;
use jiff::Timestamp;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    credentials::{self, Credentials},
    descriptor::ModelDescriptor,
    error::{ImageGenError, Result},
    prompt::PromptLine,
    provider::ImageRequest,
    registry::ModelRegistry,
    types::{BatchOutcome, BatchProgress, ExtraOptions, GenerationParams, GenerationResult, ImageSize},
};

/// Drives generation requests against the registered providers
///
/// Holds no per-request state: credentials are passed with every call and
/// the registry is shared read-only.
#[derive(Debug, Clone)]
pub struct Generator {
    registry: Arc<ModelRegistry>,
}

impl Generator {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Generate one image for `prompt`
    ///
    /// Only the first image returned by the provider is surfaced.
    pub async fn generate_one(
        &self,
        params: &GenerationParams,
        prompt: &str,
        credentials: &Credentials,
    ) -> Result<GenerationResult> {
        let (model, request) = self.prepare(params, prompt, credentials)?;

        tracing::debug!(
            model = model.id(),
            provider = model.provider(),
            size = %request.size,
            "dispatching generation request"
        );

        let response = model.adapter().generate(&request).await?;

        let image = response
            .images
            .into_iter()
            .next()
            .ok_or_else(|| ImageGenError::EmptyResult {
                model: model.id().to_owned(),
            })?;

        Ok(GenerationResult {
            image: image.image,
            width: image.width,
            height: image.height,
            model: response.model,
            provider: response.provider,
            revised_prompt: image.revised_prompt,
            generated_at: Timestamp::now(),
        })
    }

    /// Generate one image per non-blank prompt line, all at once
    ///
    /// Every unit runs on the caller's task and settles independently: a
    /// failing prompt becomes a [`BatchOutcome::Failure`] at its own index
    /// and never affects the others. `progress` receives the running count
    /// of settled units, once per unit.
    ///
    /// There is no cap on in-flight requests; a batch of `n` prompts opens
    /// `n` provider calls at once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` without dispatching anything if no prompt
    /// survives blank-line filtering.
    pub async fn generate_batch<I, S>(
        &self,
        params: &GenerationParams,
        prompts: I,
        credentials: &Credentials,
        progress: Option<&UnboundedSender<BatchProgress>>,
    ) -> Result<Vec<BatchOutcome>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines = PromptLine::parse_all(prompts);

        if lines.is_empty() {
            return Err(ImageGenError::InvalidInput(
                "Please enter at least one valid prompt".to_owned(),
            ));
        }

        let total = lines.len();
        let completed = AtomicUsize::new(0);

        tracing::info!(model = %params.model_id, total, "starting batch generation");

        let units = lines.into_iter().enumerate().map(|(index, line)| {
            let completed = &completed;

            async move {
                let outcome = match self.generate_one(params, &line.prompt, credentials).await {
                    Ok(result) => BatchOutcome::Success {
                        result,
                        original_prompt: line.original,
                        display_prompt: line.prompt,
                        suggested_name: line.suggested_name,
                    },
                    Err(error) => {
                        tracing::warn!(index, error = %error, "batch item failed");
                        BatchOutcome::Failure {
                            original_prompt: line.original,
                            error,
                        }
                    }
                };

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(progress) = progress {
                    // A caller that stopped listening does not stop the batch
                    let _ = progress.send(BatchProgress { completed: done, total });
                }

                outcome
            }
        });

        let outcomes = join_all(units).await;

        tracing::info!(
            total,
            failed = outcomes.iter().filter(|o| !o.is_success()).count(),
            "batch generation finished"
        );

        Ok(outcomes)
    }

    /// Validate inputs and build the provider request
    fn prepare(
        &self,
        params: &GenerationParams,
        prompt: &str,
        credentials: &Credentials,
    ) -> Result<(&ModelDescriptor, ImageRequest)> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ImageGenError::InvalidInput("Please enter a prompt".to_owned()));
        }

        let model = self.registry.get(&params.model_id)?;
        let credential = credentials::resolve(model, credentials)?.clone();
        let size = resolve_size(model, params.size.as_deref())?;
        let options = validate_options(model, &params.extra_options)?;

        let request = ImageRequest {
            credential,
            model: model.upstream_model(),
            prompt: prompt.to_owned(),
            size,
            n: 1,
            options,
        };

        Ok((model, request))
    }
}

fn resolve_size(model: &ModelDescriptor, requested: Option<&str>) -> Result<ImageSize> {
    let Some(raw) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(model.default_size());
    };

    let size: ImageSize = raw
        .parse()
        .map_err(|e| ImageGenError::InvalidInput(format!("{e}")))?;

    if !model.supports_size(size) {
        return Err(ImageGenError::InvalidInput(format!(
            "size {size} is not supported by {}",
            model.id()
        )));
    }

    Ok(size)
}

/// Keep declared options with legal values; undeclared names are dropped
fn validate_options(model: &ModelDescriptor, requested: &ExtraOptions) -> Result<ExtraOptions> {
    let mut accepted = ExtraOptions::new();

    for (name, value) in requested {
        let Some(schema) = model.option_schema(name) else {
            tracing::trace!(model = model.id(), option = %name, "ignoring undeclared option");
            continue;
        };

        if !schema.allows(value) {
            return Err(ImageGenError::InvalidInput(format!(
                "'{value}' is not a valid {name} for {}",
                model.id()
            )));
        }

        accepted.insert(name.clone(), value.clone());
    }

    Ok(accepted)
}
