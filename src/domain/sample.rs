use serde::{Deserialize, Serialize, Serializer};
use std::ops::RangeInclusive;

/// Months in a year; also the divisor for month features.
pub const MONTHS: u32 = 12;

/// Longest billing cycle in months; also the divisor for the cycle feature.
pub const MAX_BILLING_CYCLE: u32 = 6;

/// Unit range drawn for synthetic last-paid bills
pub const UNITS_RANGE: RangeInclusive<u32> = 100..=3000;

/// Cities the synthesizer draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    Chennai,
    Delhi,
    Mumbai,
    Kolkata,
    Bangalore,
}

impl City {
    pub const ALL: [City; 5] = [
        City::Chennai,
        City::Delhi,
        City::Mumbai,
        City::Kolkata,
        City::Bangalore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            City::Chennai => "Chennai",
            City::Delhi => "Delhi",
            City::Mumbai => "Mumbai",
            City::Kolkata => "Kolkata",
            City::Bangalore => "Bangalore",
        }
    }
}

impl std::fmt::Display for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Seasonal bucket of the billed month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Summer,
    Monsoon,
    Winter,
}

impl Season {
    /// Season of a calendar month (1-12)
    pub fn of_month(month: u32) -> Self {
        match month {
            3..=6 => Season::Summer,
            7..=9 => Season::Monsoon,
            _ => Season::Winter,
        }
    }

    /// Bounds of `delta_units / last_paid_units` for this season
    pub fn delta_fraction_bounds(&self) -> (f64, f64) {
        match self {
            Season::Summer => (0.10, 0.30),
            Season::Monsoon => (-0.05, 0.05),
            Season::Winter => (-0.25, -0.10),
        }
    }
}

/// Month billed `billing_cycle` months after `last_paid_month`.
///
/// `((last_paid_month + billing_cycle - 1) mod 12) + 1`, always in 1..=12.
pub fn target_month(last_paid_month: u32, billing_cycle: u32) -> u32 {
    // widen before adding so huge cycles cannot overflow
    let sum = u64::from(last_paid_month) + u64::from(billing_cycle);
    ((sum + u64::from(MONTHS) - 1) % u64::from(MONTHS)) as u32 + 1
}

/// One labeled row of the usage dataset.
///
/// Field order matches the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub city: String,
    pub last_paid_month: u32,
    pub billing_cycle: u32,
    #[serde(serialize_with = "serialize_units")]
    pub last_paid_units: f64,
    pub target_month: u32,
    pub delta_units: f64,
}

/// Whole unit counts are written as integers (`2926`, not `2926.0`).
fn serialize_units<S: Serializer>(units: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    // 2^53: every integer below is exact in f64
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if units.fract() == 0.0 && units.abs() < MAX_EXACT {
        serializer.serialize_i64(*units as i64)
    } else {
        serializer.serialize_f64(*units)
    }
}

impl Sample {
    pub fn season(&self) -> Season {
        Season::of_month(self.target_month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_month_wraps_into_calendar() {
        for month in 1..=MONTHS {
            for cycle in 1..=MAX_BILLING_CYCLE {
                let target = target_month(month, cycle);
                assert!((1..=MONTHS).contains(&target));
                assert_eq!(target, (month + cycle - 1) % 12 + 1);
            }
        }
    }

    #[test]
    fn target_month_examples() {
        assert_eq!(target_month(1, 3), 4);
        assert_eq!(target_month(12, 1), 1);
        assert_eq!(target_month(11, 6), 5);
        assert_eq!(target_month(6, 6), 12);
        assert_eq!(target_month(9, 3), 12);
        assert_eq!(target_month(1, u32::MAX), target_month(1, u32::MAX % 12));
    }

    #[test]
    fn seasons_cover_calendar() {
        assert_eq!(Season::of_month(3), Season::Summer);
        assert_eq!(Season::of_month(6), Season::Summer);
        assert_eq!(Season::of_month(7), Season::Monsoon);
        assert_eq!(Season::of_month(9), Season::Monsoon);
        assert_eq!(Season::of_month(10), Season::Winter);
        assert_eq!(Season::of_month(1), Season::Winter);
    }

    #[test]
    fn whole_units_serialize_as_integers() {
        let mut sample = Sample {
            city: "Bangalore".to_string(),
            last_paid_month: 3,
            billing_cycle: 5,
            last_paid_units: 2926.0,
            target_month: 8,
            delta_units: -82.99,
        };
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["last_paid_units"].to_string(), "2926");

        sample.last_paid_units = 812.5;
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["last_paid_units"].to_string(), "812.5");
    }

    #[test]
    fn city_names_roundtrip_display() {
        let names: Vec<String> = City::ALL.iter().map(|c| c.to_string()).collect();
        assert_eq!(names, ["Chennai", "Delhi", "Mumbai", "Kolkata", "Bangalore"]);
    }
}
