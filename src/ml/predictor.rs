use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::round2;
use crate::domain::target_month;
use crate::error::PredictError;
use crate::ml::artifacts::ModelBundle;
use crate::ml::features::RawFeatures;

/// Date format accepted for `last_paid_date`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One prediction query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub city: String,
    pub last_paid_units: f64,
    /// `YYYY-MM-DD`
    pub last_paid_date: String,
    pub billing_cycle: u32,
}

/// Projected usage for the target month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub delta: f64,
    pub predicted_units: f64,
    pub target_month: u32,
}

/// Runs requests through the loaded model bundle
#[derive(Debug, Clone)]
pub struct Predictor {
    bundle: ModelBundle,
}

impl Predictor {
    pub fn new(bundle: ModelBundle) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn predict(
        &self,
        request: &PredictionRequest,
    ) -> std::result::Result<PredictionResponse, PredictError> {
        let last_paid_month = NaiveDate::parse_from_str(&request.last_paid_date, DATE_FORMAT)
            .map_err(|_| PredictError::InvalidDate {
                value: request.last_paid_date.clone(),
            })?
            .month();
        let target = target_month(last_paid_month, request.billing_cycle);

        let columns = self.bundle.columns();
        let features = columns.encode(
            RawFeatures {
                city: &request.city,
                last_paid_month,
                billing_cycle: request.billing_cycle,
                target_month: target,
                last_paid_units: request.last_paid_units,
            },
            self.bundle.units_scaler(),
        )?;

        let network = self.bundle.network();
        if features.len() != network.input_dim {
            return Err(PredictError::FeatureMismatch {
                got: features.len(),
                expected: network.input_dim,
            });
        }
        let scaled_delta = network
            .forward_scalar(&features)
            .map_err(|e| PredictError::Model(e.to_string()))?;

        let delta = self.bundle.delta_scaler().inverse_transform(scaled_delta);
        if !delta.is_finite() {
            return Err(PredictError::Model(format!(
                "non-finite delta {delta} from scaled output {scaled_delta}"
            )));
        }
        // NaN falls through f64::max to 0
        let predicted_units = (request.last_paid_units + delta).max(0.0);

        debug!(
            city = %request.city,
            target_month = target,
            scaled_delta,
            delta,
            predicted_units,
            "Prediction computed"
        );

        Ok(PredictionResponse {
            delta: round2(delta),
            predicted_units: round2(predicted_units),
            target_month: target,
        })
    }
}
