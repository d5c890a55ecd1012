use std::io::Read;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::error::ClassifyError;

/// Where a request's image comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Url(String),
    Bytes(Vec<u8>),
    Base64(String),
}

impl ImageSource {
    /// Interprets a combined input field: anything starting with `http` is a
    /// URL, everything else is treated as base64 image data.
    pub fn from_combined(value: &str) -> ImageSource {
        let value = value.trim();
        if value.starts_with("http") {
            ImageSource::Url(value.to_owned())
        } else {
            ImageSource::Base64(value.to_owned())
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ImageSource::Url(_) => "url",
            ImageSource::Bytes(_) => "bytes",
            ImageSource::Base64(_) => "base64",
        }
    }

    /// Rejects empty inputs before any network or decode work happens.
    pub fn validate(&self) -> Result<(), ClassifyError> {
        let empty = match self {
            ImageSource::Url(u) => u.trim().is_empty(),
            ImageSource::Bytes(b) => b.is_empty(),
            ImageSource::Base64(s) => s.trim().is_empty(),
        };
        if empty {
            return Err(ClassifyError::Input(format!("no image {} was supplied", self.kind())));
        }
        Ok(())
    }
}

/// Retrieves raw image bytes for a URL.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ClassifyError>;
}

/// Blocking HTTP fetcher: one attempt, bounded by timeouts and a size cap.
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> HttpFetcher {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        HttpFetcher { agent, max_bytes: config.max_image_bytes }
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ClassifyError> {
        debug!(url, "fetching image");
        let response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::Status(code, _) => {
                ClassifyError::Fetch(format!("{} responded with HTTP {}", url, code))
            }
            ureq::Error::Transport(t) => ClassifyError::Fetch(t.to_string()),
        })?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(self.max_bytes as u64 + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| ClassifyError::Fetch(format!("reading response body: {}", e)))?;

        if bytes.len() > self.max_bytes {
            warn!(url, limit = self.max_bytes, "remote image exceeds size limit");
            return Err(ClassifyError::Fetch(format!(
                "image is larger than the {} byte limit",
                self.max_bytes
            )));
        }
        Ok(bytes)
    }
}

/// Resolves a source into raw image bytes, fetching or base64-decoding as needed.
pub fn resolve_bytes(
    source: ImageSource,
    fetcher: &dyn ImageFetcher,
    max_bytes: usize,
) -> Result<Vec<u8>, ClassifyError> {
    source.validate()?;
    let bytes = match source {
        ImageSource::Url(url) => fetcher.fetch(url.trim())?,
        ImageSource::Bytes(bytes) => bytes,
        ImageSource::Base64(encoded) => {
            // Line-wrapped payloads (76-column MIME output) are accepted.
            let compact: Vec<u8> = encoded.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
            // Four base64 characters carry three bytes.
            if compact.len() / 4 * 3 > max_bytes + 3 {
                return Err(too_large(max_bytes));
            }
            STANDARD.decode(&compact)?
        }
    };
    if bytes.len() > max_bytes {
        return Err(too_large(max_bytes));
    }
    Ok(bytes)
}

/// Decodes PNG/JPEG/BMP/GIF bytes into a bitmap.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ClassifyError> {
    Ok(image::load_from_memory(bytes)?)
}

fn too_large(max_bytes: usize) -> ClassifyError {
    ClassifyError::Decode(format!("image is larger than the {} byte limit", max_bytes))
}
