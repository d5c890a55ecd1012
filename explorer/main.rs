//! Plug data explorer
//!
//! Dashboard over two core datasets: a cross plot of plug properties and a
//! well-log plot of core gamma. Selecting plugs in the cross plot highlights
//! them in the log. Figures are built here as plotly JSON and drawn in the
//! browser by plotly.js.
//!
//! Run with:
//!   cargo run --bin explorer --release
//! Then open http://127.0.0.1:8050

mod routes;
#[path = "../server/util/form.rs"]
mod form;

use std::sync::Arc;

use anyhow::Context;
use tiny_http::Server;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plug_vision::config;
use plug_vision::dashboard::{load_gamma, load_samples, Datasets};

fn main() -> anyhow::Result<()> {
    let config = config::get_configuration().context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().json().with_level(true))
        .init();

    let explorer = &config.explorer;
    let data = Arc::new(Datasets {
        samples: load_samples(&explorer.samples_path)?,
        gamma: load_gamma(&explorer.gamma_path)?,
    });
    info!(
        samples = data.samples.len(),
        gamma_readings = data.gamma.len(),
        "datasets loaded"
    );

    let addr = explorer.get_address();
    let server = Server::http(&addr)
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", addr, e))?;
    info!(address = %addr, "listening");

    for request in server.incoming_requests() {
        let data = data.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, data);
        });
    }
    Ok(())
}
