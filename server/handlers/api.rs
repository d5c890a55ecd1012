use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use plug_vision::{ClassifyError, ImageSource};

use crate::routes::Reply;
use crate::state::SharedState;
use crate::util::form::{form_get, parse_form};

/// Body of `POST /post` and `POST /api/v1.0`.
#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: Option<String>,
}

/// Body of `POST /base64` and `POST /api/v0.1`: base64 image data, or a URL.
#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub image: Option<String>,
}

// ---------------------------------------------------------------------------
// GET /predict?url=..
// ---------------------------------------------------------------------------

pub fn predict_url_query(query: &str, state: &SharedState) -> Reply {
    let pairs = parse_form(query);
    let url = form_get(&pairs, "url").map(str::to_owned);
    respond(required(url, "url").map(ImageSource::Url), state)
}

// ---------------------------------------------------------------------------
// POST /post
// ---------------------------------------------------------------------------

pub fn post_url(body: &[u8], state: &SharedState) -> Reply {
    let source = parse_json::<UrlRequest>(body)
        .and_then(|req| required(req.url, "url"))
        .map(ImageSource::Url);
    respond(source, state)
}

// ---------------------------------------------------------------------------
// POST /base64, POST /api/v0.1
// ---------------------------------------------------------------------------

pub fn post_image(body: &[u8], state: &SharedState) -> Reply {
    let source = parse_json::<ImageRequest>(body)
        .and_then(|req| required(req.image, "image"))
        .map(|image| ImageSource::from_combined(&image));
    respond(source, state)
}

// ---------------------------------------------------------------------------
// POST|OPTIONS /api/v1.0
// ---------------------------------------------------------------------------

pub fn post_url_cors(body: &[u8], state: &SharedState) -> Reply {
    post_url(body, state).with_header("Access-Control-Allow-Origin", "*")
}

pub fn preflight() -> Reply {
    Reply::new(204, "text/plain", Vec::new())
        .with_header("Access-Control-Allow-Origin", "*")
        .with_header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .with_header("Access-Control-Allow-Headers", "Content-Type")
        .with_header("Access-Control-Max-Age", "86400")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn respond(source: Result<ImageSource, ClassifyError>, state: &SharedState) -> Reply {
    match source.and_then(|s| state.pipeline.classify(s)) {
        Ok(result) => Reply::json(&result),
        Err(e) => {
            warn!(error = %e, "classification request failed");
            Reply::json_error(&e)
        }
    }
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ClassifyError> {
    serde_json::from_slice(body)
        .map_err(|e| ClassifyError::Input(format!("request body must be a JSON object: {}", e)))
}

/// Rejects absent and blank fields before any fetch or decode.
fn required(value: Option<String>, field: &str) -> Result<String, ClassifyError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_owned()),
        _ => Err(ClassifyError::Input(format!("missing `{}` field", field))),
    }
}
