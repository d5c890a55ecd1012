use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// A fully connected layer loaded from a trained model.
///
/// `weights` is `input_size × size` and `biases` is `1 × size`, so a forward
/// pass is `a = act(x · W + b)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer{
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction
}

impl Layer {
    /// Builds a layer from explicit parameters.
    pub fn from_parts(weights: Matrix, biases: Vec<f64>, activator: ActivationFunction) -> Layer {
        Layer {
            size: weights.cols,
            weights,
            biases: Matrix::from_data(vec![biases]),
            activator,
        }
    }

    /// Number of inputs this layer consumes.
    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Checks that `size`, `weights` and `biases` agree with each other.
    pub fn shape_error(&self) -> Option<String> {
        if !self.weights.is_consistent() {
            return Some("weights rows/cols do not match data".into());
        }
        if !self.biases.is_consistent() || self.biases.rows != 1 {
            return Some("biases must be a single consistent row".into());
        }
        if self.weights.cols != self.size || self.biases.cols != self.size {
            return Some(format!(
                "size {} disagrees with weights ({} cols) or biases ({} cols)",
                self.size, self.weights.cols, self.biases.cols
            ));
        }
        None
    }

    pub fn feed_forward(&self, input: &[f64]) -> Vec<f64> {
        let mut z = self.weights.vec_mul(input);
        for (zi, b) in z.iter_mut().zip(self.biases.data[0].iter()) {
            *zi += b;
        }
        self.activator.apply(z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_layer_is_affine() {
        let layer = Layer::from_parts(
            Matrix::from_data(vec![vec![2.0], vec![-1.0]]),
            vec![0.5],
            ActivationFunction::Identity,
        );
        assert_eq!(layer.input_size(), 2);
        assert_eq!(layer.feed_forward(&[1.0, 1.0]), vec![1.5]);
    }

    #[test]
    fn reports_bias_width_mismatch() {
        let mut layer = Layer::from_parts(
            Matrix::zeros(3, 2),
            vec![0.0, 0.0],
            ActivationFunction::ReLU,
        );
        assert!(layer.shape_error().is_none());
        layer.biases = Matrix::from_data(vec![vec![0.0]]);
        assert!(layer.shape_error().is_some());
    }
}
