//! Records produced and consumed by a scan pass.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::time::JulianDate;

/// Where a longitude came from. Predicted values only select candidates;
/// every spread that reaches a final answer is computed from observed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LongitudeSource {
    Predicted,
    Observed,
}

/// A single body longitude at an epoch, normalized to [0, 360).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongitudeSample {
    pub body: String,
    pub epoch: JulianDate,
    pub longitude: qtty::Degrees,
    pub source: LongitudeSource,
}

/// Verified spread for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadResult {
    pub date: NaiveDate,
    /// Smallest arc containing all observed longitudes.
    pub spread: qtty::Degrees,
    pub longitudes: Vec<LongitudeSample>,
    pub passed: bool,
}

/// A date that could not be verified because the collaborator failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDate {
    pub date: NaiveDate,
    pub body: String,
    pub reason: String,
}

/// Maximal run of consecutive qualifying days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentInterval {
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    #[serde(rename = "min_spread_degrees")]
    pub min_spread: qtty::Degrees,
}

impl AlignmentInterval {
    pub fn single(date: NaiveDate, spread: qtty::Degrees) -> Self {
        Self {
            start_date: date,
            end_date: date,
            min_spread: spread,
        }
    }

    pub fn is_single_day(&self) -> bool {
        self.start_date == self.end_date
    }

    /// Number of days covered, inclusive.
    pub fn len_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Text contract consumed by downstream tooling:
/// `YYYY-MM-DD 〜 YYYY-MM-DD  span<= X.XX°` or `YYYY-MM-DD  span<= X.XX°`.
impl fmt::Display for AlignmentInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_day() {
            write!(
                f,
                "{}  span<= {:.2}°",
                self.start_date.format("%Y-%m-%d"),
                self.min_spread.value()
            )
        } else {
            write!(
                f,
                "{} 〜 {}  span<= {:.2}°",
                self.start_date.format("%Y-%m-%d"),
                self.end_date.format("%Y-%m-%d"),
                self.min_spread.value()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_display_multi_day() {
        let interval = AlignmentInterval {
            start_date: date(2026, 5, 15),
            end_date: date(2026, 5, 17),
            min_spread: qtty::Degrees::new(7.0),
        };
        assert_eq!(interval.to_string(), "2026-05-15 〜 2026-05-17  span<= 7.00°");
    }

    #[test]
    fn test_display_single_day() {
        let interval = AlignmentInterval::single(date(2027, 3, 22), qtty::Degrees::new(9.456));
        assert_eq!(interval.to_string(), "2027-03-22  span<= 9.46°");
    }

    #[test]
    fn test_serialize_field_names() {
        let interval = AlignmentInterval::single(date(2027, 3, 22), qtty::Degrees::new(4.5));
        let json = serde_json::to_value(interval).unwrap();
        assert_eq!(json["start_date"], "2027-03-22");
        assert_eq!(json["end_date"], "2027-03-22");
        assert_eq!(json["min_spread_degrees"], 4.5);
    }

    #[test]
    fn test_len_days() {
        let interval = AlignmentInterval {
            start_date: date(2026, 2, 27),
            end_date: date(2026, 3, 1),
            min_spread: qtty::Degrees::new(1.0),
        };
        assert_eq!(interval.len_days(), 3);
        assert!(interval.contains(date(2026, 2, 28)));
        assert!(!interval.is_single_day());
    }
}
