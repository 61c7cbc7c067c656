//! Min-max scaling fitted at training time and replayed at inference.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, WattError};

/// Affine map of the fitted range onto [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub data_min: f64,
    pub data_max: f64,
}

impl MinMaxScaler {
    /// Fit over observed values. Fails on empty or non-finite input.
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(WattError::Validation(
                "cannot fit scaler on empty input".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(WattError::Validation(
                "cannot fit scaler on non-finite values".to_string(),
            ));
        }

        let data_min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let data_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(Self { data_min, data_max })
    }

    /// Width of the fitted range; a constant column scales by 1.
    fn span(&self) -> f64 {
        let span = self.data_max - self.data_min;
        if span == 0.0 {
            1.0
        } else {
            span
        }
    }

    pub fn transform(&self, x: f64) -> f64 {
        (x - self.data_min) / self.span()
    }

    pub fn inverse_transform(&self, y: f64) -> f64 {
        y * self.span() + self.data_min
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let scaler: Self = serde_json::from_str(&content)?;
        if !scaler.data_min.is_finite()
            || !scaler.data_max.is_finite()
            || scaler.data_min > scaler.data_max
        {
            return Err(WattError::Model(format!(
                "invalid scaler range [{}, {}]",
                scaler.data_min, scaler.data_max
            )));
        }
        Ok(scaler)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_fitted_range_to_unit_interval() {
        let scaler = MinMaxScaler::fit(&[100.0, 550.0, 3000.0]).unwrap();
        assert_eq!(scaler.transform(100.0), 0.0);
        assert_eq!(scaler.transform(3000.0), 1.0);
        assert!((scaler.transform(1550.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn inverse_undoes_transform() {
        let scaler = MinMaxScaler::fit(&[-750.0, 12.5, 900.0]).unwrap();
        let mut x = -750.0;
        while x <= 900.0 {
            let back = scaler.transform(scaler.inverse_transform(scaler.transform(x)));
            assert!((back - scaler.transform(x)).abs() < 1e-9);
            assert!((scaler.inverse_transform(scaler.transform(x)) - x).abs() < 1e-9);
            x += 37.25;
        }
    }

    #[test]
    fn constant_column_uses_unit_scale() {
        let scaler = MinMaxScaler::fit(&[42.0, 42.0]).unwrap();
        assert_eq!(scaler.transform(42.0), 0.0);
        assert_eq!(scaler.inverse_transform(0.0), 42.0);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(MinMaxScaler::fit(&[]).is_err());
        assert!(MinMaxScaler::fit(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn persists_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("units_scaler.json");
        let scaler = MinMaxScaler::fit(&[100.0, 3000.0]).unwrap();
        scaler.save(&path).unwrap();
        assert_eq!(MinMaxScaler::from_file(&path).unwrap(), scaler);
    }
}
