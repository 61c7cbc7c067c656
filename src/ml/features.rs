//! Feature layout shared by training and inference.
//!
//! Four numeric columns come first, in a fixed order, followed by one
//! `city_<Name>` indicator per city observed at training time (sorted by
//! name). The layout is persisted next to the network so inference builds
//! vectors in exactly the order the network was trained on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::domain::{Sample, MAX_BILLING_CYCLE, MONTHS};
use crate::error::{PredictError, Result, WattError};
use crate::ml::scaler::MinMaxScaler;

pub const LAST_PAID_MONTH_NORM: &str = "last_paid_month_norm";
pub const BILLING_CYCLE_NORM: &str = "billing_cycle_norm";
pub const TARGET_MONTH_NORM: &str = "target_month_norm";
pub const LAST_PAID_UNITS_SCALED: &str = "last_paid_units_scaled";

pub const NUMERIC_COLUMNS: [&str; 4] = [
    LAST_PAID_MONTH_NORM,
    BILLING_CYCLE_NORM,
    TARGET_MONTH_NORM,
    LAST_PAID_UNITS_SCALED,
];

pub const CITY_PREFIX: &str = "city_";

/// Raw values one feature vector is built from
#[derive(Debug, Clone, Copy)]
pub struct RawFeatures<'a> {
    pub city: &'a str,
    pub last_paid_month: u32,
    pub billing_cycle: u32,
    pub target_month: u32,
    pub last_paid_units: f64,
}

impl<'a> From<&'a Sample> for RawFeatures<'a> {
    fn from(s: &'a Sample) -> Self {
        Self {
            city: &s.city,
            last_paid_month: s.last_paid_month,
            billing_cycle: s.billing_cycle,
            target_month: s.target_month,
            last_paid_units: s.last_paid_units,
        }
    }
}

/// Ordered feature-column names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureColumns(Vec<String>);

impl FeatureColumns {
    /// Build the layout from the cities present in a dataset
    pub fn from_cities<'a, I>(cities: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unique: BTreeSet<&str> = cities.into_iter().collect();
        let mut names: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        names.extend(unique.into_iter().map(|c| format!("{CITY_PREFIX}{c}")));
        Self(names)
    }

    pub fn from_names(names: Vec<String>) -> std::result::Result<Self, String> {
        let columns = Self(names);
        columns.validate()?;
        Ok(columns)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.0.len() <= NUMERIC_COLUMNS.len() {
            return Err(format!(
                "expected {} numeric columns plus at least one city column, got {} columns",
                NUMERIC_COLUMNS.len(),
                self.0.len()
            ));
        }
        for (idx, expected) in NUMERIC_COLUMNS.iter().enumerate() {
            if self.0[idx] != *expected {
                return Err(format!(
                    "column[{idx}] is {:?}, expected {expected:?}",
                    self.0[idx]
                ));
            }
        }
        let mut seen = BTreeSet::new();
        for name in &self.0[NUMERIC_COLUMNS.len()..] {
            if !name.starts_with(CITY_PREFIX) || name.len() == CITY_PREFIX.len() {
                return Err(format!("unexpected non-city column {name:?}"));
            }
            if !seen.insert(name.as_str()) {
                return Err(format!("duplicate column {name:?}"));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// City names with an indicator column, in column order
    pub fn cities(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter_map(|c| c.strip_prefix(CITY_PREFIX))
            .collect()
    }

    /// Build a feature vector in column order.
    ///
    /// Fails with `UnknownCity` when no indicator column matches.
    pub fn encode(
        &self,
        raw: RawFeatures<'_>,
        units_scaler: &MinMaxScaler,
    ) -> std::result::Result<Vec<f64>, PredictError> {
        let mut vector = Vec::with_capacity(self.0.len());
        let mut city_hit = false;

        for column in &self.0 {
            let value = match column.as_str() {
                LAST_PAID_MONTH_NORM => f64::from(raw.last_paid_month) / f64::from(MONTHS),
                BILLING_CYCLE_NORM => f64::from(raw.billing_cycle) / f64::from(MAX_BILLING_CYCLE),
                TARGET_MONTH_NORM => f64::from(raw.target_month) / f64::from(MONTHS),
                LAST_PAID_UNITS_SCALED => units_scaler.transform(raw.last_paid_units),
                other => match other.strip_prefix(CITY_PREFIX) {
                    Some(city) if city == raw.city => {
                        city_hit = true;
                        1.0
                    }
                    _ => 0.0,
                },
            };
            vector.push(value);
        }

        if !city_hit {
            return Err(PredictError::UnknownCity {
                city: raw.city.to_string(),
            });
        }
        Ok(vector)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let names: Vec<String> = serde_json::from_str(&content)?;
        Self::from_names(names).map_err(WattError::Model)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler() -> MinMaxScaler {
        MinMaxScaler {
            data_min: 100.0,
            data_max: 3100.0,
        }
    }

    #[test]
    fn city_columns_sorted_and_unique() {
        let cols = FeatureColumns::from_cities(["Mumbai", "Delhi", "Mumbai", "Bangalore"]);
        assert_eq!(
            cols.names(),
            [
                "last_paid_month_norm",
                "billing_cycle_norm",
                "target_month_norm",
                "last_paid_units_scaled",
                "city_Bangalore",
                "city_Delhi",
                "city_Mumbai",
            ]
        );
        assert_eq!(cols.cities(), ["Bangalore", "Delhi", "Mumbai"]);
        assert!(cols.validate().is_ok());
    }

    #[test]
    fn encodes_in_column_order() {
        let cols = FeatureColumns::from_cities(["Delhi", "Chennai"]);
        let v = cols
            .encode(
                RawFeatures {
                    city: "Delhi",
                    last_paid_month: 6,
                    billing_cycle: 3,
                    target_month: 8,
                    last_paid_units: 1600.0,
                },
                &scaler(),
            )
            .unwrap();
        assert_eq!(v, vec![0.5, 0.5, 8.0 / 12.0, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn unknown_city_rejected() {
        let cols = FeatureColumns::from_cities(["Delhi"]);
        let err = cols
            .encode(
                RawFeatures {
                    city: "delhi",
                    last_paid_month: 1,
                    billing_cycle: 1,
                    target_month: 1,
                    last_paid_units: 500.0,
                },
                &scaler(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            PredictError::UnknownCity {
                city: "delhi".to_string()
            }
        );
    }

    #[test]
    fn validate_catches_misordered_layout() {
        let names = vec![
            "billing_cycle_norm".to_string(),
            "last_paid_month_norm".to_string(),
            "target_month_norm".to_string(),
            "last_paid_units_scaled".to_string(),
            "city_Delhi".to_string(),
        ];
        assert!(FeatureColumns::from_names(names).is_err());

        let no_city: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        assert!(FeatureColumns::from_names(no_city).is_err());
    }
}
