//! Logging for `PixelMuse`
//!
//! Installs a `tracing` subscriber writing to stderr so stdout stays free
//! for command output.

use pixelmuse_config::{LogConfig, LogFormat};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging from configuration
///
/// `RUST_LOG` overrides the configured filter when set. `verbose` raises the
/// crate's own targets to debug on top of whichever filter is active.
///
/// # Errors
///
/// Returns an error if the filter directive is malformed or a global
/// subscriber is already installed
pub fn init(config: &LogConfig, verbose: bool) -> anyhow::Result<()> {
    let mut filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::try_new(directive),
        _ => EnvFilter::try_new(&config.filter),
    }
    .map_err(|e| anyhow::anyhow!("invalid log filter: {e}"))?;

    if verbose {
        filter = filter.add_directive(
            "pixelmuse=debug"
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid log directive: {e}"))?,
        );
        filter = filter.add_directive(
            "pixelmuse_imagegen=debug"
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid log directive: {e}"))?,
        );
    }

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}
