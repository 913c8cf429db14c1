//! Human-readable output for models, results and errors

use std::fmt::Write as _;

use pixelmuse_imagegen::{AdapterErrorKind, GenerationResult, ImageGenError, ModelRegistry, OptionValues};
use secrecy::{ExposeSecret, SecretString};

/// Catalog listing grouped by provider, default model marked
pub fn model_list(registry: &ModelRegistry) -> String {
    let default_id = registry.default_model().id();
    let mut out = String::new();

    for (provider, models) in registry.providers() {
        let _ = writeln!(out, "{provider}");

        for model in models {
            let marker = if model.id() == default_id { " (default)" } else { "" };
            let _ = writeln!(out, "  {}{marker}  {}", model.id(), model.display_name());
            let _ = writeln!(out, "    {}", model.description());

            let sizes = model
                .supported_sizes()
                .iter()
                .map(|choice| choice.size.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "    sizes: {sizes} (default {})", model.default_size());

            for option in model.extra_options() {
                let values = match option.values {
                    OptionValues::Choices(choices) => choices.iter().map(|c| c.value).collect::<Vec<_>>().join(", "),
                    OptionValues::Range { min, max } => format!("{min}-{max}"),
                };
                let _ = writeln!(out, "    {}: {values}", option.name);
            }
        }
    }

    out
}

/// Short description of a successful generation
pub fn result_summary(result: &GenerationResult) -> String {
    let mut out = format!(
        "{} via {} ({}x{})",
        result.model, result.provider, result.width, result.height
    );

    if let Some(revised) = &result.revised_prompt {
        let _ = write!(out, "\n  revised prompt: {revised}");
    }

    out
}

/// Error message with guidance on what the user can do about it
pub fn error_message(error: &ImageGenError) -> String {
    match error {
        ImageGenError::MissingCredential { provider } => {
            format!("{error}. Add a {provider} API key with `pixelmuse keys set \"{provider}\" <key>`")
        }
        ImageGenError::Adapter(adapter) => match adapter.kind() {
            AdapterErrorKind::Authentication => format!("{error}. Please check your API key"),
            AdapterErrorKind::RateLimit => format!("{error}. Please try again later"),
            AdapterErrorKind::Generic => error.to_string(),
        },
        _ => error.to_string(),
    }
}

/// Key with everything but its edges hidden
pub fn masked_key(key: &SecretString) -> String {
    let key = key.expose_secret();
    let chars = key.chars().count();

    if chars <= 8 {
        return "*".repeat(chars);
    }

    let head = key.chars().take(3).collect::<String>();
    let tail = key.chars().skip(chars - 4).collect::<String>();

    format!("{head}...{tail}")
}
