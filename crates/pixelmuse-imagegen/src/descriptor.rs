//! Static model metadata and the descriptor that binds it to a provider

use std::{fmt, sync::Arc};

use crate::{provider::ImageGenProvider, types::ImageSize};

/// One legal value of an option, with its presentation label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

impl Choice {
    pub const fn new(value: &'static str, label: &'static str) -> Self {
        Self { value, label }
    }
}

/// One supported output size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeChoice {
    pub size: ImageSize,
    pub label: &'static str,
}

impl SizeChoice {
    pub const fn new(width: u32, height: u32, label: &'static str) -> Self {
        Self {
            size: ImageSize::new(width, height),
            label,
        }
    }

    pub const fn auto(label: &'static str) -> Self {
        Self {
            size: ImageSize::Auto,
            label,
        }
    }
}

/// Legal values of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionValues {
    /// One of a fixed set
    Choices(&'static [Choice]),
    /// An integer within `min..=max`
    Range { min: u32, max: u32 },
}

/// An additional named option a model accepts, with its legal values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSchema {
    pub name: &'static str,
    pub values: OptionValues,
}

impl OptionSchema {
    pub const fn choices(name: &'static str, choices: &'static [Choice]) -> Self {
        Self {
            name,
            values: OptionValues::Choices(choices),
        }
    }

    pub const fn range(name: &'static str, min: u32, max: u32) -> Self {
        Self {
            name,
            values: OptionValues::Range { min, max },
        }
    }

    pub const fn is_numeric(&self) -> bool {
        matches!(self.values, OptionValues::Range { .. })
    }

    pub fn allows(&self, value: &str) -> bool {
        match self.values {
            OptionValues::Choices(choices) => choices.iter().any(|c| c.value == value),
            OptionValues::Range { min, max } => value.parse::<u32>().is_ok_and(|v| (min..=max).contains(&v)),
        }
    }
}

/// Declarative description of a model, as published by its provider
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    /// Registry-wide identifier
    pub id: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    /// Identifier the provider API expects
    pub upstream_model: &'static str,
    pub default_size: ImageSize,
    pub supported_sizes: &'static [SizeChoice],
    pub extra_options: &'static [OptionSchema],
}

/// A registered model: its spec plus the adapter that generates for it
#[derive(Clone)]
pub struct ModelDescriptor {
    spec: ModelSpec,
    provider: Arc<dyn ImageGenProvider>,
}

impl ModelDescriptor {
    pub(crate) fn new(spec: ModelSpec, provider: Arc<dyn ImageGenProvider>) -> Self {
        Self { spec, provider }
    }

    pub const fn id(&self) -> &'static str {
        self.spec.id
    }

    pub const fn display_name(&self) -> &'static str {
        self.spec.display_name
    }

    pub const fn description(&self) -> &'static str {
        self.spec.description
    }

    /// Provider name, also the key into the credential mapping
    pub fn provider(&self) -> &str {
        self.provider.name()
    }

    pub const fn upstream_model(&self) -> &'static str {
        self.spec.upstream_model
    }

    pub const fn default_size(&self) -> ImageSize {
        self.spec.default_size
    }

    pub const fn supported_sizes(&self) -> &'static [SizeChoice] {
        self.spec.supported_sizes
    }

    pub const fn extra_options(&self) -> &'static [OptionSchema] {
        self.spec.extra_options
    }

    pub fn supports_size(&self, size: ImageSize) -> bool {
        self.spec.supported_sizes.iter().any(|c| c.size == size)
    }

    pub fn option_schema(&self, name: &str) -> Option<&'static OptionSchema> {
        self.spec.extra_options.iter().find(|o| o.name == name)
    }

    pub(crate) fn adapter(&self) -> &dyn ImageGenProvider {
        self.provider.as_ref()
    }
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("id", &self.spec.id)
            .field("provider", &self.provider.name())
            .field("default_size", &self.spec.default_size)
            .finish_non_exhaustive()
    }
}
