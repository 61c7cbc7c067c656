use std::path::Path;
use tracing::info;

use crate::domain::Sample;
use crate::error::{Result, WattError};

/// Read a usage CSV (synthesized or hand-made) into samples.
///
/// Any malformed row aborts the load with the underlying CSV error.
pub fn load_samples<P: AsRef<Path>>(path: P) -> Result<Vec<Sample>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(WattError::Dataset(format!(
            "dataset file not found: {}",
            path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let samples = reader
        .deserialize::<Sample>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    info!(rows = samples.len(), path = %path.display(), "Dataset loaded");
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_hand_written_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "city,last_paid_month,billing_cycle,last_paid_units,target_month,delta_units"
        )
        .unwrap();
        writeln!(file, "Delhi,1,3,1200,3,240.5").unwrap();
        writeln!(file, "Pune,12,1,800,12,-100").unwrap();

        let samples = load_samples(file.path()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].city, "Delhi");
        assert_eq!(samples[0].target_month, 3);
        assert_eq!(samples[1].delta_units, -100.0);
    }

    #[test]
    fn malformed_row_propagates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "city,last_paid_month,billing_cycle,last_paid_units,target_month,delta_units"
        )
        .unwrap();
        writeln!(file, "Delhi,january,3,1200,3,240.5").unwrap();

        assert!(matches!(load_samples(file.path()), Err(WattError::Csv(_))));
    }

    #[test]
    fn missing_file_is_dataset_error() {
        let err = load_samples("/nonexistent/usage.csv").unwrap_err();
        assert!(matches!(err, WattError::Dataset(_)));
    }
}
