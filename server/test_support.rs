//! Fixtures shared by the handler tests: a fake fetcher, a tiny classifier
//! over grid features, and in-memory PNGs.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};

use plug_vision::{
    ActivationFunction, ClassifyError, Classifier, ImageFetcher, Layer, Matrix, ModelMetadata,
    Network, Pipeline, FEATURE_LEN,
};

use crate::state::{AppState, SharedState};

/// Serves canned bytes per URL and counts calls.
#[derive(Default)]
pub struct FakeFetcher {
    pub responses: HashMap<String, Vec<u8>>,
    pub calls: Arc<AtomicUsize>,
}

impl ImageFetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| ClassifyError::Fetch(format!("{} returned 404", url)))
    }
}

/// cat/dog model with zero weights: always 0.82 cat, 0.18 dog.
pub fn constant_classifier() -> Classifier {
    classifier_with(vec![vec![0.0, 0.0]; FEATURE_LEN], vec![0.82f64.ln(), 0.18f64.ln()], &["cat", "dog"])
}

/// dark/light model: the "light" logit grows with mean brightness.
pub fn brightness_classifier() -> Classifier {
    let w = 8.0 / FEATURE_LEN as f64;
    classifier_with(vec![vec![0.0, w]; FEATURE_LEN], vec![4.0, 0.0], &["dark", "light"])
}

fn classifier_with(weights: Vec<Vec<f64>>, biases: Vec<f64>, labels: &[&str]) -> Classifier {
    let network = Network::new(
        vec![Layer::from_parts(Matrix::from_data(weights), biases, ActivationFunction::Softmax)],
        ModelMetadata {
            description: None,
            input_type: None,
            output_labels: labels.iter().map(|s| s.to_string()).collect(),
        },
    );
    Classifier::from_network(network).expect("fixture model is valid")
}

pub fn state_with(classifier: Classifier, fetcher: FakeFetcher) -> SharedState {
    Arc::new(AppState {
        pipeline: Pipeline::new(classifier, Box::new(fetcher), 1 << 20),
        max_body_bytes: 1 << 20,
    })
}

/// A uniform greyscale PNG.
pub fn png(side: u32, level: u8) -> Vec<u8> {
    let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(side, side, Luma([level])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageOutputFormat::Png).expect("png encodes");
    buf.into_inner()
}

/// A `multipart/form-data` body with one file field.
pub fn multipart(boundary: &str, field: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"img.png\"\r\nContent-Type: image/png\r\n\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}
