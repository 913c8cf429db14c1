use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pixelmuse_config::DEFAULT_CONFIG_FILE;

/// PixelMuse image generator
#[derive(Debug, Parser)]
#[command(name = "pixelmuse", about = "Generate images from text prompts with OpenAI and Stability AI models")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, env = "PIXELMUSE_CONFIG")]
    pub config: PathBuf,

    /// Log debug output for pixelmuse itself
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List available models grouped by provider
    Models,

    /// Manage stored provider API keys
    Keys {
        #[command(subcommand)]
        action: KeysCommand,
    },

    /// Generate a single image
    Generate(GenerateArgs),

    /// Generate one image per prompt line, concurrently
    Batch(BatchArgs),
}

#[derive(Debug, Subcommand)]
pub enum KeysCommand {
    /// Store the API key for a provider
    Set {
        /// Provider name, e.g. "OpenAI" or "Stability AI"
        provider: String,
        key: String,
    },

    /// Show which providers have a stored key
    List,

    /// Forget the stored key for a provider
    Remove { provider: String },
}

/// Model selection and output options shared by `generate` and `batch`
#[derive(Debug, clap::Args)]
pub struct ModelArgs {
    /// Model id; defaults to the configured default model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Output size as WIDTHxHEIGHT, or "auto" where supported
    #[arg(short, long)]
    pub size: Option<String>,

    /// Model-specific option, repeatable
    #[arg(short = 'O', long = "option", value_name = "KEY=VALUE", value_parser = parse_option)]
    pub options: Vec<(String, String)>,

    /// Directory images are written to
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Debug, clap::Args)]
pub struct GenerateArgs {
    pub prompt: String,

    /// File name for the image, without extension
    #[arg(short, long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, clap::Args)]
pub struct BatchArgs {
    /// File with one prompt per line; reads stdin when omitted or "-"
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,
}

fn parse_option(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing option name in '{raw}'"));
    }

    Ok((key.to_owned(), value.trim().to_owned()))
}
