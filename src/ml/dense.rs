//! Dense network evaluation (CPU-only, no training framework).
//!
//! The trained regressor is exported into this plain JSON form so the
//! prediction service can run it with nothing but serde.
//!
//! Shapes are validated on load; a forward pass with the wrong input width is
//! rejected instead of silently misaligning columns.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, WattError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Linear,
    Relu,
}

impl Default for Activation {
    fn default() -> Self {
        Self::Linear
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Weights shape: [out_dim][in_dim]
    pub weights: Vec<Vec<f64>>,
    /// Bias shape: [out_dim]
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn in_dim(&self) -> usize {
        self.weights.first().map(|r| r.len()).unwrap_or(0)
    }

    fn out_dim(&self) -> usize {
        self.weights.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseNetwork {
    /// Expected input dimension.
    pub input_dim: usize,

    pub layers: Vec<DenseLayer>,

    /// Free-form training metadata (epochs, final loss, ...).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl DenseNetwork {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let model: Self = serde_json::from_str(&content)?;
        model.validate().map_err(WattError::Model)?;
        Ok(model)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate().map_err(WattError::Model)?;
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.input_dim == 0 {
            return Err("input_dim must be > 0".to_string());
        }
        if self.layers.is_empty() {
            return Err("layers must not be empty".to_string());
        }

        let mut expected_in = self.input_dim;
        for (idx, layer) in self.layers.iter().enumerate() {
            if layer.out_dim() == 0 {
                return Err(format!("layer[{idx}] out_dim must be > 0"));
            }
            if layer.bias.len() != layer.out_dim() {
                return Err(format!(
                    "layer[{idx}] bias len {} != out_dim {}",
                    layer.bias.len(),
                    layer.out_dim()
                ));
            }
            for (r, row) in layer.weights.iter().enumerate() {
                if row.len() != expected_in {
                    return Err(format!(
                        "layer[{idx}] weights row {r} len {} != expected in_dim {expected_in}",
                        row.len()
                    ));
                }
                if row.iter().any(|v| !v.is_finite()) {
                    return Err(format!("layer[{idx}] weights contain non-finite values"));
                }
            }
            if layer.bias.iter().any(|v| !v.is_finite()) {
                return Err(format!("layer[{idx}] bias contain non-finite values"));
            }
            expected_in = layer.out_dim();
        }
        Ok(())
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map(|l| l.out_dim()).unwrap_or(0)
    }

    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_dim {
            return Err(WattError::Model(format!(
                "DenseNetwork input dim mismatch: got {}, expected {}",
                input.len(),
                self.input_dim
            )));
        }

        let mut x: Vec<f64> = input.to_vec();

        for layer in &self.layers {
            let in_dim = layer.in_dim();
            let y: Vec<f64> = layer
                .weights
                .iter()
                .zip(&layer.bias)
                .map(|(row, b)| {
                    debug_assert_eq!(row.len(), in_dim);
                    let sum = row.iter().zip(&x).fold(*b, |acc, (w, xi)| acc + w * xi);
                    apply_activation(sum, layer.activation)
                })
                .collect();
            x = y;
        }

        Ok(x)
    }

    pub fn forward_scalar(&self, input: &[f64]) -> Result<f64> {
        let out = self.forward(input)?;
        if out.len() != 1 {
            return Err(WattError::Model(format!(
                "DenseNetwork forward_scalar expects output_dim=1, got {}",
                out.len()
            )));
        }
        Ok(out[0])
    }
}

fn apply_activation(x: f64, act: Activation) -> f64 {
    match act {
        Activation::Linear => x,
        Activation::Relu => x.max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_layer() -> DenseNetwork {
        DenseNetwork {
            input_dim: 2,
            layers: vec![
                DenseLayer {
                    weights: vec![vec![1.0, -1.0], vec![0.5, 0.5]],
                    bias: vec![0.0, 1.0],
                    activation: Activation::Relu,
                },
                DenseLayer {
                    weights: vec![vec![2.0, 1.0]],
                    bias: vec![-0.5],
                    activation: Activation::Linear,
                },
            ],
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn forward_applies_relu_between_layers() {
        let net = two_layer();
        net.validate().unwrap();

        // hidden = relu([1 - 3, 0.5 + 1.5 + 1]) = [0, 3]; out = 0 + 3 - 0.5
        let y = net.forward_scalar(&[1.0, 3.0]).unwrap();
        assert!((y - 2.5).abs() < 1e-12);

        // hidden = relu([3 - 1, 2 + 1]) = [2, 3]; out = 4 + 3 - 0.5
        let y = net.forward_scalar(&[3.0, 1.0]).unwrap();
        assert!((y - 6.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_wrong_input_width() {
        let net = two_layer();
        assert!(net.forward(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn validates_shapes() {
        let bad = DenseNetwork {
            input_dim: 3,
            layers: vec![DenseLayer {
                weights: vec![vec![1.0, 2.0]], // in_dim mismatch
                bias: vec![0.0],
                activation: Activation::Linear,
            }],
            metadata: serde_json::json!({}),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn json_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.json");
        two_layer().save(&path).unwrap();

        let loaded = DenseNetwork::from_file(&path).unwrap();
        assert_eq!(loaded.input_dim, 2);
        assert_eq!(loaded.output_dim(), 1);
        assert_eq!(loaded.layers[0].activation, Activation::Relu);
    }
}
