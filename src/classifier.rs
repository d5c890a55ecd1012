use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::activation::activation::ActivationFunction;
use crate::error::{ClassifyError, ModelLoadError};
use crate::features::GRID_SIDE;
use crate::network::{InputType, Network};

/// Outcome of one classification, serialized as
/// `{"class": .., "prob": .., "classes": [..], "probs": [..]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "class")]
    pub label: String,
    pub prob: f64,
    pub classes: Vec<String>,
    pub probs: Vec<f64>,
}

/// A verified, read-only model plus its ordered label set.
///
/// Built once at startup and shared by reference; `classify` takes `&self`.
#[derive(Debug, Clone)]
pub struct Classifier {
    network: Network,
    labels: Vec<String>,
}

impl Classifier {
    /// Loads a model file and runs every structural check on it.
    pub fn load(path: impl AsRef<Path>) -> Result<Classifier, ModelLoadError> {
        Classifier::from_network(Network::load_json(path)?)
    }

    /// Wraps a network, checking that it produces a labelled probability
    /// distribution and accepts greyscale grid features.
    pub fn from_network(network: Network) -> Result<Classifier, ModelLoadError> {
        network.validate_shapes()?;

        let last = &network.layers[network.layers.len() - 1];
        if last.activator != ActivationFunction::Softmax {
            return Err(ModelLoadError::Shape(format!(
                "output layer must use Softmax, found {:?}",
                last.activator
            )));
        }

        match &network.metadata.input_type {
            None | Some(InputType::Numeric) => {}
            Some(InputType::ImageGrayscale { width, height })
                if *width == GRID_SIDE && *height == GRID_SIDE => {}
            Some(other) => {
                return Err(ModelLoadError::Shape(format!(
                    "model declares input {:?}, expected {}x{} greyscale",
                    other, GRID_SIDE, GRID_SIDE
                )));
            }
        }

        let n_out = network.output_size();
        let labels = if network.metadata.output_labels.is_empty() {
            (0..n_out).map(|i| i.to_string()).collect()
        } else {
            network.metadata.output_labels.clone()
        };
        if labels.len() != n_out {
            return Err(ModelLoadError::Shape(format!(
                "{} output labels for {} outputs",
                labels.len(), n_out
            )));
        }

        Ok(Classifier { network, labels })
    }

    /// Fails when the model does not take `expected` features.
    ///
    /// Called at startup with `FEATURE_LEN` so a mismatched model never serves.
    pub fn verify_input_len(&self, expected: usize) -> Result<(), ModelLoadError> {
        if self.input_len() != expected {
            return Err(ModelLoadError::Shape(format!(
                "model expects {} input values, feature extraction produces {}",
                self.input_len(), expected
            )));
        }
        Ok(())
    }

    pub fn input_len(&self) -> usize {
        self.network.input_size()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn classify(&self, features: &[f64]) -> Result<ClassificationResult, ClassifyError> {
        if features.len() != self.input_len() {
            return Err(ClassifyError::Model(format!(
                "feature vector has {} values, model expects {}",
                features.len(), self.input_len()
            )));
        }

        let probs = self.network.forward(features);
        let best = argmax(&probs);
        let result = ClassificationResult {
            label: self.labels[best].clone(),
            prob: probs[best],
            classes: self.labels.clone(),
            probs,
        };
        debug!(class = %result.label, prob = result.prob, "classified");
        Ok(result)
    }
}

/// Index of the largest value. Ties (and NaNs) keep the earliest index.
pub fn argmax(v: &[f64]) -> usize {
    let mut best = 0;
    for (i, &x) in v.iter().enumerate().skip(1) {
        if x > v[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::dense::Layer;
    use crate::math::matrix::Matrix;
    use crate::network::ModelMetadata;

    /// Single softmax layer whose logits are `x · W + b`.
    fn single_layer(weights: Vec<Vec<f64>>, biases: Vec<f64>, labels: &[&str]) -> Network {
        Network::new(
            vec![Layer::from_parts(Matrix::from_data(weights), biases, ActivationFunction::Softmax)],
            ModelMetadata {
                description: None,
                input_type: None,
                output_labels: labels.iter().map(|s| s.to_string()).collect(),
            },
        )
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.25, 0.5, 0.5, 0.25]), 1);
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.1]), 0);
    }

    #[test]
    fn result_invariants_hold() {
        let clf = Classifier::from_network(single_layer(
            vec![vec![1.0, -1.0, 0.3], vec![0.2, 0.4, -2.0]],
            vec![0.0, 0.1, 0.2],
            &["cat", "dog", "rock"],
        )).unwrap();

        for input in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.7, 0.2]] {
            let r = clf.classify(&input).unwrap();
            let best = argmax(&r.probs);
            assert_eq!(r.probs[best], r.prob);
            assert_eq!(r.classes[best], r.label);
            assert_eq!(r.classes, vec!["cat", "dog", "rock"]);
            let sum: f64 = r.probs.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn tied_probabilities_pick_first_label() {
        let clf = Classifier::from_network(single_layer(
            vec![vec![0.0, 0.0]],
            vec![0.0, 0.0],
            &["cat", "dog"],
        )).unwrap();
        let r = clf.classify(&[0.3]).unwrap();
        assert_eq!(r.label, "cat");
        assert_eq!(r.prob, 0.5);
    }

    #[test]
    fn wrong_feature_length_is_a_model_error() {
        let clf = Classifier::from_network(single_layer(vec![vec![0.0, 0.0]; 3], vec![0.0, 0.0], &["a", "b"])).unwrap();
        let err = clf.classify(&[0.0; 4]).unwrap_err();
        assert!(matches!(err, ClassifyError::Model(_)));
        assert!(clf.verify_input_len(3).is_ok());
        assert!(clf.verify_input_len(1024).is_err());
    }

    #[test]
    fn rejects_non_softmax_output() {
        let mut net = single_layer(vec![vec![0.0, 0.0]], vec![0.0, 0.0], &["a", "b"]);
        net.layers[0].activator = ActivationFunction::Sigmoid;
        assert!(Classifier::from_network(net).is_err());
    }

    #[test]
    fn rejects_label_count_mismatch() {
        let net = single_layer(vec![vec![0.0, 0.0]], vec![0.0, 0.0], &["only-one"]);
        assert!(Classifier::from_network(net).is_err());
    }

    #[test]
    fn rejects_wrong_declared_input_type() {
        let mut net = single_layer(vec![vec![0.0, 0.0]], vec![0.0, 0.0], &["a", "b"]);
        net.metadata.input_type = Some(InputType::ImageGrayscale { width: 28, height: 28 });
        assert!(Classifier::from_network(net).is_err());
    }

    #[test]
    fn missing_labels_fall_back_to_indices() {
        let clf = Classifier::from_network(single_layer(vec![vec![0.0, 1.0]], vec![0.0, 0.0], &[])).unwrap();
        assert_eq!(clf.labels(), &["0".to_string(), "1".to_string()]);
        assert_eq!(clf.classify(&[5.0]).unwrap().label, "1");
    }

    #[test]
    fn serializes_with_class_key() {
        let r = ClassificationResult {
            label: "cat".into(),
            prob: 0.82,
            classes: vec!["cat".into(), "dog".into()],
            probs: vec![0.82, 0.18],
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"class": "cat", "prob": 0.82, "classes": ["cat", "dog"], "probs": [0.82, 0.18]})
        );
    }
}
