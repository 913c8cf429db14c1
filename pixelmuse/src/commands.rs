use std::path::Path;

use anyhow::Context as _;
use pixelmuse_imagegen::{BatchOutcome, GenerationParams, ModelRegistry, credentials::check_key_format};
use pixelmuse_store::default_file_stem;
use secrecy::SecretString;
use tokio::{io::AsyncReadExt, sync::mpsc};

use crate::{
    App, canonical_provider,
    args::{BatchArgs, GenerateArgs, KeysCommand, ModelArgs},
    render,
};

pub fn models(app: &App) {
    print!("{}", render::model_list(app.generator.registry()));
}

pub fn keys(app: &mut App, action: KeysCommand) -> anyhow::Result<()> {
    let registry = app.generator.registry();

    match action {
        KeysCommand::Set { provider, key } => {
            let provider = canonical_provider(registry, &provider)?;
            check_key_format(&provider, &key)?;

            app.keys.set(&provider, &SecretString::from(key))?;
            println!("Stored API key for {provider}");
        }
        KeysCommand::List => {
            for provider in registry.providers().keys() {
                let status = match app.keys.get(provider) {
                    Some(key) => render::masked_key(&key),
                    None => "not set".to_owned(),
                };
                let overridden = if app.config.credentials.keys().any(|k| k.trim().eq_ignore_ascii_case(provider)) {
                    " (overridden by config)"
                } else {
                    ""
                };
                println!("{provider}: {status}{overridden}");
            }
        }
        KeysCommand::Remove { provider } => {
            let provider = canonical_provider(registry, &provider)?;

            if app.keys.remove(&provider)? {
                println!("Removed API key for {provider}");
            } else {
                println!("No API key stored for {provider}");
            }
        }
    }

    Ok(())
}

pub async fn generate(app: &App, args: GenerateArgs) -> anyhow::Result<()> {
    let params = generation_params(app.generator.registry(), &args.model);

    let result = app
        .generator
        .generate_one(&params, &args.prompt, &app.credentials()?)
        .await
        .map_err(|e| anyhow::anyhow!(render::error_message(&e)))?;

    println!("{}", render::result_summary(&result));

    let stem = args
        .name
        .unwrap_or_else(|| default_file_stem(args.prompt.trim(), &params.model_id, result.generated_at));

    let path = app.saver.save(&result.image, &args.model.out, &stem).await?;
    println!("Saved {}", path.display());

    Ok(())
}

pub async fn batch(app: &App, args: &BatchArgs) -> anyhow::Result<()> {
    let input = read_prompts(args.file.as_deref()).await?;
    let params = generation_params(app.generator.registry(), &args.model);
    let credentials = app.credentials()?;

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();

    let run = async {
        let outcomes = app
            .generator
            .generate_batch(&params, input.lines(), &credentials, Some(&progress_tx))
            .await;
        drop(progress_tx);
        outcomes
    };

    let report = async {
        while let Some(progress) = progress_rx.recv().await {
            eprintln!("{} of {} done", progress.completed, progress.total);
        }
    };

    let (outcomes, ()) = tokio::join!(run, report);
    let outcomes = outcomes.map_err(|e| anyhow::anyhow!(render::error_message(&e)))?;

    let total = outcomes.len();
    let mut failed = 0;

    for outcome in &outcomes {
        match outcome {
            BatchOutcome::Success {
                result,
                display_prompt,
                suggested_name,
                ..
            } => {
                let stem = suggested_name
                    .clone()
                    .unwrap_or_else(|| default_file_stem(display_prompt, &params.model_id, result.generated_at));

                match app.saver.save(&result.image, &args.model.out, &stem).await {
                    Ok(path) => println!("Saved {} ({})", path.display(), render::result_summary(result)),
                    Err(e) => {
                        failed += 1;
                        println!("Failed to save image for \"{display_prompt}\": {e}");
                    }
                }
            }
            BatchOutcome::Failure { original_prompt, error } => {
                failed += 1;
                println!("Failed: \"{original_prompt}\": {}", render::error_message(error));
            }
        }
    }

    if failed == total {
        anyhow::bail!("all {total} prompts failed");
    }

    if failed > 0 {
        println!("{} of {total} images generated", total - failed);
    }

    Ok(())
}

fn generation_params(registry: &ModelRegistry, args: &ModelArgs) -> GenerationParams {
    let model_id = args
        .model
        .clone()
        .unwrap_or_else(|| registry.default_model().id().to_owned());

    let mut params = GenerationParams::new(model_id);

    if let Some(size) = &args.size {
        params = params.with_size(size.clone());
    }

    for (name, value) in &args.options {
        params = params.with_option(name.clone(), value.clone());
    }

    params
}

async fn read_prompts(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read prompts from {}", path.display())),
        _ => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("failed to read prompts from stdin")?;
            Ok(input)
        }
    }
}
