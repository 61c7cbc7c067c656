pub mod api;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod ml;
pub mod training;

pub use config::AppConfig;
pub use dataset::{load_samples, write_csv, DatasetSynthesizer};
pub use domain::{target_month, City, Sample, Season};
pub use error::{PredictError, Result, WattError};
pub use ml::{ModelBundle, PredictionRequest, PredictionResponse, Predictor};
pub use training::{Trainer, TrainingReport};
