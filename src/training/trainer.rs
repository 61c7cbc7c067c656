//! Training Loop
//!
//! Fits the delta network on a usage dataset: min-max scaling for units and
//! deltas, shuffled mini-batches, Adam and MSE. The result is exported as a
//! [`ModelBundle`] ready to be saved for the prediction service.

use burn::backend::Autodiff;
use burn::module::AutodiffModule;
use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::{ElementConversion, TensorData};
use burn_ndarray::NdArray;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::TrainingConfig;
use crate::domain::Sample;
use crate::error::{Result, WattError};
use crate::ml::{
    DeltaNetwork, DeltaNetworkConfig, FeatureColumns, MinMaxScaler, ModelBundle, RawFeatures,
};

/// CPU backend with gradient tracking
pub type TrainBackend = Autodiff<NdArray<f32>>;

/// Outcome of one training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Mean batch loss of every epoch, in order
    pub epoch_losses: Vec<f64>,
    /// Rows trained on
    pub samples: usize,
    /// Feature layout the network was fitted with
    pub columns: FeatureColumns,
}

impl TrainingReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.epoch_losses.last().copied()
    }
}

/// Design matrix and scaled targets, row-major
struct PreparedData {
    features: Vec<f32>,
    targets: Vec<f32>,
    width: usize,
    columns: FeatureColumns,
    units_scaler: MinMaxScaler,
    delta_scaler: MinMaxScaler,
}

impl PreparedData {
    fn rows(&self) -> usize {
        self.targets.len()
    }
}

/// Supervised trainer for the delta network
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Fit scalers and network on `samples`
    pub fn fit(&self, samples: &[Sample]) -> Result<(ModelBundle, TrainingReport)> {
        if samples.is_empty() {
            return Err(WattError::Dataset("no samples to train on".to_string()));
        }
        if self.config.batch_size == 0 {
            return Err(WattError::Validation("batch_size must be positive".to_string()));
        }

        let data = prepare(samples)?;
        let device = Default::default();
        let mut rng = match self.config.seed {
            Some(seed) => {
                TrainBackend::seed(seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        info!(
            samples = data.rows(),
            features = data.width,
            epochs = self.config.epochs,
            batch_size = self.config.batch_size,
            learning_rate = self.config.learning_rate,
            "Starting training"
        );

        let mut model: DeltaNetwork<TrainBackend> =
            DeltaNetworkConfig::new(data.width).init(&device);
        let mut optim = AdamConfig::new().with_epsilon(1e-8).init();
        let loss_fn = MseLoss::new();

        let mut indices: Vec<usize> = (0..data.rows()).collect();
        let mut epoch_losses = Vec::with_capacity(self.config.epochs);
        let started = Instant::now();

        for epoch in 1..=self.config.epochs {
            indices.shuffle(&mut rng);

            let mut total_loss = 0.0;
            let mut batches = 0usize;
            for batch in indices.chunks(self.config.batch_size) {
                let (x, y) = batch_tensors(&data, batch, &device);

                let prediction = model.forward(x);
                let loss = loss_fn.forward(prediction, y, Reduction::Mean);
                total_loss += loss.clone().into_scalar().elem::<f64>();
                batches += 1;

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(self.config.learning_rate, model, grads);
            }

            let avg_loss = total_loss / batches as f64;
            info!(epoch, loss = format!("{avg_loss:.4}"), "Epoch complete");
            epoch_losses.push(avg_loss);
        }

        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Training loop finished");

        let metadata = serde_json::json!({
            "epochs": self.config.epochs,
            "batch_size": self.config.batch_size,
            "learning_rate": self.config.learning_rate,
            "samples": data.rows(),
            "final_loss": epoch_losses.last(),
            "trained_at": chrono::Utc::now().to_rfc3339(),
        });
        let network = model.valid().to_dense(metadata)?;

        let report = TrainingReport {
            epoch_losses,
            samples: data.rows(),
            columns: data.columns.clone(),
        };
        let bundle = ModelBundle::new(network, data.units_scaler, data.delta_scaler, data.columns)?;

        info!(
            final_loss = report.final_loss().unwrap_or(f64::NAN),
            "Training complete"
        );
        Ok((bundle, report))
    }
}

fn prepare(samples: &[Sample]) -> Result<PreparedData> {
    let units: Vec<f64> = samples.iter().map(|s| s.last_paid_units).collect();
    let deltas: Vec<f64> = samples.iter().map(|s| s.delta_units).collect();
    let units_scaler = MinMaxScaler::fit(&units)?;
    let delta_scaler = MinMaxScaler::fit(&deltas)?;

    let columns = FeatureColumns::from_cities(samples.iter().map(|s| s.city.as_str()));
    let width = columns.len();

    let mut features = Vec::with_capacity(samples.len() * width);
    for sample in samples {
        let row = columns
            .encode(RawFeatures::from(sample), &units_scaler)
            .map_err(|e| WattError::Internal(format!("failed to encode training row: {e}")))?;
        features.extend(row.into_iter().map(|v| v as f32));
    }
    let targets = deltas
        .iter()
        .map(|d| delta_scaler.transform(*d) as f32)
        .collect();

    Ok(PreparedData {
        features,
        targets,
        width,
        columns,
        units_scaler,
        delta_scaler,
    })
}

fn batch_tensors<B: Backend>(
    data: &PreparedData,
    batch: &[usize],
    device: &B::Device,
) -> (Tensor<B, 2>, Tensor<B, 2>) {
    let mut xs = Vec::with_capacity(batch.len() * data.width);
    let mut ys = Vec::with_capacity(batch.len());
    for &row in batch {
        let start = row * data.width;
        xs.extend_from_slice(&data.features[start..start + data.width]);
        ys.push(data.targets[row]);
    }

    let x = Tensor::from_data(TensorData::new(xs, [batch.len(), data.width]), device);
    let y = Tensor::from_data(TensorData::new(ys, [batch.len(), 1]), device);
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetSynthesizer;
    use crate::ml::{PredictionRequest, Predictor};

    fn small_config(epochs: usize) -> TrainingConfig {
        TrainingConfig {
            epochs,
            batch_size: 32,
            learning_rate: 1e-3,
            seed: Some(11),
        }
    }

    #[test]
    fn rejects_empty_dataset() {
        let trainer = Trainer::new(small_config(1));
        assert!(matches!(trainer.fit(&[]), Err(WattError::Dataset(_))));
    }

    #[test]
    fn prepare_scales_targets_into_unit_range() {
        let samples = DatasetSynthesizer::new(StdRng::seed_from_u64(5)).generate(300);
        let data = prepare(&samples).unwrap();

        assert_eq!(data.rows(), 300);
        assert_eq!(data.features.len(), 300 * data.width);
        assert!(data.targets.iter().all(|t| (0.0..=1.0).contains(t)));
        assert_eq!(data.width, data.columns.len());
    }

    #[test]
    fn short_run_reports_one_loss_per_epoch() {
        let samples = DatasetSynthesizer::new(StdRng::seed_from_u64(9)).generate(400);
        let trainer = Trainer::new(small_config(5));

        let (bundle, report) = trainer.fit(&samples).unwrap();

        assert_eq!(report.epoch_losses.len(), 5);
        assert!(report.epoch_losses.iter().all(|l| l.is_finite() && *l >= 0.0));
        assert!(report.epoch_losses[4] < report.epoch_losses[0]);
        assert_eq!(report.samples, 400);
        assert_eq!(bundle.network().input_dim, bundle.columns().len());
        assert_eq!(bundle.columns().cities().len(), 5);
    }

    #[test]
    fn trained_bundle_serves_predictions() {
        let samples = DatasetSynthesizer::new(StdRng::seed_from_u64(21)).generate(300);
        let (bundle, _) = Trainer::new(small_config(2)).fit(&samples).unwrap();
        let predictor = Predictor::new(bundle);

        let resp = predictor
            .predict(&PredictionRequest {
                city: "Mumbai".to_string(),
                last_paid_units: 1500.0,
                last_paid_date: "2024-01-15".to_string(),
                billing_cycle: 3,
            })
            .unwrap();
        assert_eq!(resp.target_month, 4);
        assert!(resp.delta.is_finite());
        assert!(resp.predicted_units >= 0.0);
    }
}
