pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod error;
pub mod config;
pub mod features;
pub mod classifier;
pub mod acquire;
pub mod pipeline;
pub mod chart;
pub mod dashboard;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{InputType, ModelMetadata, Network};
pub use error::{ClassifyError, DatasetError, ModelLoadError};
pub use classifier::{ClassificationResult, Classifier};
pub use acquire::{HttpFetcher, ImageFetcher, ImageSource};
pub use pipeline::Pipeline;
pub use features::FEATURE_LEN;
