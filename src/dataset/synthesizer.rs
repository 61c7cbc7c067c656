//! Synthetic usage dataset
//!
//! Draws independent bills and labels each with a seasonal usage delta:
//! summer months go up 10-30%, monsoon months drift within ±5%, and the
//! rest of the year drops 10-25%.

use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::domain::{target_month, City, Sample, Season, MAX_BILLING_CYCLE, MONTHS, UNITS_RANGE};
use crate::error::Result;

/// Default number of generated rows
pub const DEFAULT_SAMPLES: usize = 5000;

/// Generates labeled samples from the seasonal heuristic
pub struct DatasetSynthesizer<R: Rng> {
    rng: R,
}

impl<R: Rng> DatasetSynthesizer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draw one sample
    pub fn sample(&mut self) -> Sample {
        let city = City::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(City::Chennai);
        let last_paid_units = self.rng.gen_range(UNITS_RANGE);
        let billing_cycle = self.rng.gen_range(1..=MAX_BILLING_CYCLE);
        let last_paid_month = self.rng.gen_range(1..=MONTHS);
        let target = target_month(last_paid_month, billing_cycle);

        let (lo, hi) = Season::of_month(target).delta_fraction_bounds();
        let fraction = self.rng.gen_range(lo..=hi);
        let delta_units = round2(f64::from(last_paid_units) * fraction);

        Sample {
            city: city.to_string(),
            last_paid_month,
            billing_cycle,
            last_paid_units: f64::from(last_paid_units),
            target_month: target,
            delta_units,
        }
    }

    /// Draw `count` independent samples
    pub fn generate(&mut self, count: usize) -> Vec<Sample> {
        (0..count).map(|_| self.sample()).collect()
    }
}

/// Write samples as CSV with a header row, replacing any existing file.
pub fn write_csv<P: AsRef<Path>>(path: P, samples: &[Sample]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    for sample in samples {
        writer.serialize(sample)?;
    }
    writer.flush()?;

    info!(rows = samples.len(), path = %path.display(), "Synthetic dataset written");
    Ok(())
}

/// Round to 2 decimal places.
///
/// Magnitudes past 1e15 have no fractional cents left to round and are
/// returned as-is, so scaling by 100 never overflows to infinity.
pub fn round2(x: f64) -> f64 {
    if !x.is_finite() || x.abs() >= 1e15 {
        return x;
    }
    (x * 100.0).round() / 100.0
}
