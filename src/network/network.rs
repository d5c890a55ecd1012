use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::ModelLoadError;
use crate::layers::dense::Layer;
use crate::network::metadata::ModelMetadata;

/// A trained feed-forward network as read from a model file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: ModelMetadata,
}

impl Network {
    pub fn new(layers: Vec<Layer>, metadata: ModelMetadata) -> Network {
        Network { layers, metadata }
    }

    /// Forward pass. Inference only; the network is never mutated.
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.feed_forward(&current);
        }
        current
    }

    /// Width of the input layer, or 0 for an empty network.
    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }

    /// Width of the output layer, or 0 for an empty network.
    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.size).unwrap_or(0)
    }

    /// Checks every layer's internal shape and that consecutive layers chain.
    pub fn validate_shapes(&self) -> Result<(), ModelLoadError> {
        if self.layers.is_empty() {
            return Err(ModelLoadError::Shape("model has no layers".into()));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if let Some(reason) = layer.shape_error() {
                return Err(ModelLoadError::Shape(format!("layer {}: {}", i, reason)));
            }
        }
        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].size != pair[1].input_size() {
                return Err(ModelLoadError::Shape(format!(
                    "layer {} outputs {} values but layer {} expects {}",
                    i, pair[0].size, i + 1, pair[1].input_size()
                )));
            }
        }
        Ok(())
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ModelLoadError> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON model file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Network, ModelLoadError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::math::matrix::Matrix;

    fn two_layer() -> Network {
        Network::new(
            vec![
                Layer::from_parts(Matrix::zeros(4, 3), vec![0.0; 3], ActivationFunction::ReLU),
                Layer::from_parts(Matrix::zeros(3, 2), vec![0.0; 2], ActivationFunction::Softmax),
            ],
            ModelMetadata::default(),
        )
    }

    #[test]
    fn reports_io_sizes() {
        let net = two_layer();
        assert_eq!(net.input_size(), 4);
        assert_eq!(net.output_size(), 2);
        assert!(net.validate_shapes().is_ok());
    }

    #[test]
    fn rejects_layers_that_do_not_chain() {
        let mut net = two_layer();
        net.layers[1] = Layer::from_parts(Matrix::zeros(5, 2), vec![0.0; 2], ActivationFunction::Softmax);
        let err = net.validate_shapes().unwrap_err();
        assert!(err.to_string().contains("layer 0 outputs 3"));
    }

    #[test]
    fn rejects_empty_network() {
        let net = Network::new(vec![], ModelMetadata::default());
        assert!(net.validate_shapes().is_err());
    }

    #[test]
    fn json_round_trip_through_file_keeps_labels() {
        let mut net = two_layer();
        net.metadata.output_labels = vec!["cat".into(), "dog".into()];
        let path = std::env::temp_dir().join(format!("plug-vision-net-{}.json", std::process::id()));
        net.save_json(&path).unwrap();
        let loaded = Network::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.metadata.output_labels, vec!["cat", "dog"]);
        assert_eq!(loaded.forward(&[0.0; 4]), vec![0.5, 0.5]);
    }
}
