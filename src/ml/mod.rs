//! Model side of the forecaster.
//!
//! Training runs on burn (`network`), serving runs the exported
//! `dense` form so the API process stays framework-free.

pub mod artifacts;
pub mod dense;
pub mod features;
pub mod network;
pub mod predictor;
pub mod scaler;

pub use artifacts::ModelBundle;
pub use dense::{Activation, DenseLayer, DenseNetwork};
pub use features::{FeatureColumns, RawFeatures};
pub use network::{DeltaNetwork, DeltaNetworkConfig};
pub use predictor::{PredictionRequest, PredictionResponse, Predictor};
pub use scaler::MinMaxScaler;
