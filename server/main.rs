//! plug-vision inference server
//!
//! Serves the image classifier over HTTP: JSON endpoints for programs and a
//! handful of HTML pages (URL form, upload, upload with probability plot).
//! Synchronous tiny_http server, one thread per request.
//!
//! Run with:
//!   cargo run --bin server --release
//! Then open http://127.0.0.1:5000/simple

mod state;
mod render;
mod routes;
mod handlers;
mod util;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;
use tiny_http::Server;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plug_vision::{config, Classifier, HttpFetcher, Pipeline, FEATURE_LEN};

use state::AppState;

fn main() -> anyhow::Result<()> {
    let config = config::get_configuration().context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().json().with_level(true))
        .init();

    // A model that cannot serve requests stops startup here.
    let classifier = match Classifier::load(&config.model.path)
        .and_then(|c| c.verify_input_len(FEATURE_LEN).map(|_| c))
    {
        Ok(c) => c,
        Err(e) => {
            error!(path = %config.model.path, error = %e, "model verification failed");
            return Err(e).with_context(|| format!("cannot serve model {}", config.model.path));
        }
    };
    let pipeline = Pipeline::new(
        classifier,
        Box::new(HttpFetcher::new(&config.fetch)),
        config.fetch.max_image_bytes,
    );
    info!(
        path = %config.model.path,
        labels = ?pipeline.classifier().labels(),
        "model loaded"
    );
    let shared_state = Arc::new(AppState {
        pipeline,
        max_body_bytes: config.server.body_limit(config.fetch.max_image_bytes),
    });

    let addr = config.server.get_address();
    let server = Server::http(&addr)
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", addr, e))?;
    info!(address = %addr, "listening");

    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
    Ok(())
}
