//! Delta regression network
//!
//! `input -> 64 -> 32 -> 1` with ReLU after both hidden layers. This is the
//! only definition of the topology: the trainer optimizes it with burn and
//! exports it to a [`DenseNetwork`] that the prediction service evaluates.

use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

use crate::error::WattError;
use crate::ml::dense::{Activation, DenseLayer, DenseNetwork};

/// Width of the first hidden layer
pub const HIDDEN_DIM: usize = 64;

/// Width of the second hidden layer
pub const BOTTLENECK_DIM: usize = 32;

/// Delta network configuration
#[derive(Config, Debug)]
pub struct DeltaNetworkConfig {
    /// Number of feature columns
    pub input_dim: usize,
    #[config(default = "HIDDEN_DIM")]
    pub hidden_dim: usize,
    #[config(default = "BOTTLENECK_DIM")]
    pub bottleneck_dim: usize,
}

/// Regressor from a feature vector to the min-max scaled delta
#[derive(Module, Debug)]
pub struct DeltaNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    head: Linear<B>,
    activation: Relu,
}

impl DeltaNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DeltaNetwork<B> {
        let fc1 = LinearConfig::new(self.input_dim, self.hidden_dim).init(device);
        let fc2 = LinearConfig::new(self.hidden_dim, self.bottleneck_dim).init(device);
        let head = LinearConfig::new(self.bottleneck_dim, 1).init(device);

        DeltaNetwork {
            fc1,
            fc2,
            head,
            activation: Relu::new(),
        }
    }
}

impl<B: Backend> DeltaNetwork<B> {
    /// Forward pass: `[batch, input_dim] -> [batch, 1]`
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.fc1.forward(x);
        let x = self.activation.forward(x);
        let x = self.fc2.forward(x);
        let x = self.activation.forward(x);
        self.head.forward(x)
    }

    /// Copy the learned parameters into a framework-free dense network.
    pub fn to_dense(&self, metadata: serde_json::Value) -> crate::error::Result<DenseNetwork> {
        let layers = vec![
            export_linear(&self.fc1, Activation::Relu)?,
            export_linear(&self.fc2, Activation::Relu)?,
            export_linear(&self.head, Activation::Linear)?,
        ];
        let input_dim = layers[0].weights.first().map(|r| r.len()).unwrap_or(0);

        let network = DenseNetwork {
            input_dim,
            layers,
            metadata,
        };
        network.validate().map_err(WattError::Model)?;
        Ok(network)
    }
}

fn export_linear<B: Backend>(
    linear: &Linear<B>,
    activation: Activation,
) -> crate::error::Result<DenseLayer> {
    // burn stores linear weights as [d_input, d_output]
    let [d_in, d_out] = linear.weight.val().dims();
    let flat = linear
        .weight
        .val()
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| WattError::Model(format!("failed to read weights: {e:?}")))?;

    let weights: Vec<Vec<f64>> = (0..d_out)
        .map(|o| (0..d_in).map(|i| f64::from(flat[i * d_out + o])).collect())
        .collect();

    let bias = match &linear.bias {
        Some(bias) => bias
            .val()
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| WattError::Model(format!("failed to read bias: {e:?}")))?
            .into_iter()
            .map(f64::from)
            .collect(),
        None => vec![0.0; d_out],
    };

    Ok(DenseLayer {
        weights,
        bias,
        activation,
    })
}
