// Command-line classifier: runs one image through the same pipeline the
// web server uses and prints the JSON result.
//
//   cargo run -- path/to/image.png
//   cargo run -- https://example.com/cat.jpg
use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plug_vision::{config, Classifier, HttpFetcher, ImageSource, Pipeline, FEATURE_LEN};

fn main() -> anyhow::Result<()> {
    let config = config::get_configuration().context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(input) = std::env::args().nth(1) else {
        bail!("usage: plug-vision <image path | URL>");
    };

    let classifier = Classifier::load(&config.model.path)
        .with_context(|| format!("failed to load model from {}", config.model.path))?;
    classifier.verify_input_len(FEATURE_LEN)?;

    let source = if input.starts_with("http") {
        ImageSource::Url(input)
    } else {
        let bytes = std::fs::read(&input).with_context(|| format!("failed to read {}", input))?;
        ImageSource::Bytes(bytes)
    };

    let pipeline = Pipeline::new(
        classifier,
        Box::new(HttpFetcher::new(&config.fetch)),
        config.fetch.max_image_bytes,
    );
    let result = pipeline.classify(source)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
