//! Persisted training output.
//!
//! Four JSON files live in the artifacts directory: the exported network,
//! the units and delta scalers, and the ordered feature-column list.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, WattError};
use crate::ml::dense::DenseNetwork;
use crate::ml::features::FeatureColumns;
use crate::ml::scaler::MinMaxScaler;

pub const NETWORK_FILE: &str = "delta_network.json";
pub const UNITS_SCALER_FILE: &str = "units_scaler.json";
pub const DELTA_SCALER_FILE: &str = "delta_scaler.json";
pub const FEATURE_COLUMNS_FILE: &str = "feature_columns.json";

/// Everything inference needs, loaded once and never mutated
#[derive(Debug, Clone)]
pub struct ModelBundle {
    network: DenseNetwork,
    units_scaler: MinMaxScaler,
    delta_scaler: MinMaxScaler,
    columns: FeatureColumns,
}

impl ModelBundle {
    /// Assemble a bundle, rejecting a network whose input width does not
    /// match the column layout.
    pub fn new(
        network: DenseNetwork,
        units_scaler: MinMaxScaler,
        delta_scaler: MinMaxScaler,
        columns: FeatureColumns,
    ) -> Result<Self> {
        network.validate().map_err(WattError::Model)?;
        columns.validate().map_err(WattError::Model)?;

        if network.input_dim != columns.len() {
            return Err(WattError::Model(format!(
                "network expects {} inputs but {} feature columns were persisted",
                network.input_dim,
                columns.len()
            )));
        }
        if network.output_dim() != 1 {
            return Err(WattError::Model(format!(
                "network must have a single output, got {}",
                network.output_dim()
            )));
        }

        Ok(Self {
            network,
            units_scaler,
            delta_scaler,
            columns,
        })
    }

    /// Load all four artifacts from `dir`
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let network = DenseNetwork::from_file(required(dir, NETWORK_FILE)?)?;
        let units_scaler = MinMaxScaler::from_file(required(dir, UNITS_SCALER_FILE)?)?;
        let delta_scaler = MinMaxScaler::from_file(required(dir, DELTA_SCALER_FILE)?)?;
        let columns = FeatureColumns::from_file(required(dir, FEATURE_COLUMNS_FILE)?)?;

        let bundle = Self::new(network, units_scaler, delta_scaler, columns)?;
        info!(
            dir = %dir.display(),
            input_dim = bundle.network.input_dim,
            cities = ?bundle.columns.cities(),
            "Model artifacts loaded"
        );
        Ok(bundle)
    }

    /// Write all four artifacts into `dir`, creating it if needed
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        self.network.save(dir.join(NETWORK_FILE))?;
        self.units_scaler.save(dir.join(UNITS_SCALER_FILE))?;
        self.delta_scaler.save(dir.join(DELTA_SCALER_FILE))?;
        self.columns.save(dir.join(FEATURE_COLUMNS_FILE))?;

        info!(dir = %dir.display(), "Model artifacts saved");
        Ok(())
    }

    pub fn network(&self) -> &DenseNetwork {
        &self.network
    }

    pub fn units_scaler(&self) -> &MinMaxScaler {
        &self.units_scaler
    }

    pub fn delta_scaler(&self) -> &MinMaxScaler {
        &self.delta_scaler
    }

    pub fn columns(&self) -> &FeatureColumns {
        &self.columns
    }
}

fn required(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    if path.exists() {
        Ok(path)
    } else {
        Err(WattError::ArtifactNotFound(path.display().to_string()))
    }
}
