mod harness;

use std::time::Duration;

use harness::config::ConfigBuilder;
use harness::mock_provider::{HOSTED_IMAGE, MockProvider};

use pixelmuse_imagegen::{
    AdapterErrorKind, BatchOutcome, BatchProgress, Credentials, GenerationParams, Generator, ImageRef, build_registry,
};
use pixelmuse_store::{ImageSaver, StoreError, default_file_stem};
use tokio::sync::mpsc;

fn generator(mock: &MockProvider) -> Generator {
    let config = ConfigBuilder::new()
        .with_openai_provider(&mock.base_url())
        .with_stability_provider(&mock.base_url())
        .build();
    Generator::new(build_registry(&config).unwrap())
}

fn credentials() -> Credentials {
    Credentials::new()
        .with("OpenAI", "sk-test")
        .with("Stability AI", "stab-test")
}

#[tokio::test]
async fn batch_keeps_order_and_isolates_failures() {
    let mock = MockProvider::start().await.unwrap();
    let generator = generator(&mock);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let prompts = "a red fox #$fox1\n\nthis one should fail\na blue whale\n   \n";
    let outcomes = generator
        .generate_batch(
            &GenerationParams::new("gpt-image-1"),
            prompts.lines(),
            &credentials(),
            Some(&tx),
        )
        .await
        .unwrap();
    drop(tx);

    assert_eq!(outcomes.len(), 3);
    assert_eq!(mock.openai_count(), 3);

    let BatchOutcome::Success {
        display_prompt,
        suggested_name,
        original_prompt,
        ..
    } = &outcomes[0]
    else {
        panic!("first prompt should succeed");
    };
    assert_eq!(display_prompt, "a red fox");
    assert_eq!(original_prompt, "a red fox #$fox1");
    assert_eq!(suggested_name.as_deref(), Some("fox1"));

    assert_eq!(outcomes[1].original_prompt(), "this one should fail");
    assert_eq!(
        outcomes[1].error().and_then(pixelmuse_imagegen::ImageGenError::adapter_kind),
        Some(AdapterErrorKind::RateLimit)
    );

    assert!(outcomes[2].is_success());

    // The directive never reaches the provider
    let sent: Vec<_> = mock
        .requests()
        .into_iter()
        .map(|r| r.body["prompt"].as_str().unwrap().to_owned())
        .collect();
    assert!(sent.contains(&"a red fox".to_owned()));
    assert!(sent.iter().all(|p| !p.contains("#$")));

    let mut seen = Vec::new();
    while let Some(BatchProgress { completed, total }) = rx.recv().await {
        assert_eq!(total, 3);
        seen.push(completed);
    }
    assert_eq!(seen, [1, 2, 3]);
}

#[tokio::test]
async fn batch_without_prompts_sends_nothing() {
    let mock = MockProvider::start().await.unwrap();
    let generator = generator(&mock);

    let err = generator
        .generate_batch(&GenerationParams::new("dall-e-3"), ["", "  "], &credentials(), None)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("at least one valid prompt"));
    assert_eq!(mock.openai_count(), 0);
}

#[tokio::test]
async fn batch_against_stability_with_missing_key_fails_every_item() {
    let mock = MockProvider::start().await.unwrap();
    let generator = generator(&mock);

    let credentials = Credentials::new().with("OpenAI", "sk-test");
    let outcomes = generator
        .generate_batch(
            &GenerationParams::new("stable-diffusion-3"),
            ["a castle", "a moat"],
            &credentials,
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| !o.is_success()));
    assert_eq!(mock.stability_count(), 0);
}

#[tokio::test]
async fn batch_results_are_saved_by_name() {
    let mock = MockProvider::start().await.unwrap();
    let generator = generator(&mock);
    let dir = tempfile::tempdir().unwrap();
    let saver = ImageSaver::new().unwrap();

    let outcomes = generator
        .generate_batch(
            &GenerationParams::new("dall-e-3"),
            ["an old map #$map", "Stormy Sea at night, oil painting"],
            &credentials(),
            None,
        )
        .await
        .unwrap();

    let mut saved = Vec::new();
    for outcome in &outcomes {
        let BatchOutcome::Success {
            result,
            display_prompt,
            suggested_name,
            ..
        } = outcome
        else {
            panic!("every prompt should succeed");
        };

        let stem = suggested_name
            .clone()
            .unwrap_or_else(|| default_file_stem(display_prompt, "dall-e-3", result.generated_at));
        saved.push(saver.save(&result.image, dir.path(), &stem).await.unwrap());
    }

    assert_eq!(saved[0], dir.path().join("map.png"));
    assert_eq!(std::fs::read(&saved[0]).unwrap(), HOSTED_IMAGE);

    let second = saved[1].file_name().unwrap().to_str().unwrap();
    assert!(second.starts_with("stormy-sea-at-night-oil-dall-e-3-"), "{second}");
    assert!(second.ends_with(".png"));
}

#[tokio::test]
async fn shared_directive_names_do_not_overwrite() {
    let mock = MockProvider::start().await.unwrap();
    let generator = generator(&mock);
    let dir = tempfile::tempdir().unwrap();
    let saver = ImageSaver::new().unwrap();

    let outcomes = generator
        .generate_batch(
            &GenerationParams::new("stable-diffusion-xl"),
            ["a red fox #$fox", "a grey fox #$fox"],
            &credentials(),
            None,
        )
        .await
        .unwrap();

    let mut saved = Vec::new();
    for outcome in &outcomes {
        let BatchOutcome::Success {
            result, suggested_name, ..
        } = outcome
        else {
            panic!("every prompt should succeed");
        };

        let stem = suggested_name.as_deref().unwrap();
        saved.push(saver.save(&result.image, dir.path(), stem).await.unwrap());
    }

    assert_eq!(saved, [dir.path().join("fox.png"), dir.path().join("fox-2.png")]);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[tokio::test]
async fn stalled_download_times_out() {
    let mock = MockProvider::start().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let saver = ImageSaver::with_timeout(Duration::from_millis(200)).unwrap();

    let err = saver
        .save(&ImageRef::url(mock.file_url("slow.png")), dir.path(), "slow")
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Download(_)), "{err}");
    assert!(!dir.path().join("slow.png").exists());
}
