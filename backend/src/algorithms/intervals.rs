//! Merging of qualifying dates into maximal consecutive runs.

use chrono::{Duration, NaiveDate};

use crate::error::{AlignmentError, AlignmentResult};
use crate::models::AlignmentInterval;

/// Merge ascending `(date, spread)` pairs into intervals of consecutive days.
///
/// A gap of one or more missing days closes the current interval. Each interval
/// carries the minimum spread seen inside it. Unsorted or duplicate dates are a
/// domain error.
pub fn merge_intervals(
    qualifying: &[(NaiveDate, qtty::Degrees)],
) -> AlignmentResult<Vec<AlignmentInterval>> {
    let mut intervals: Vec<AlignmentInterval> = Vec::new();

    for (date, spread) in qualifying.iter().copied() {
        if let Some(current) = intervals.last_mut() {
            if date <= current.end_date {
                return Err(AlignmentError::domain(format!(
                    "qualifying dates must be strictly ascending: {} follows {}",
                    date, current.end_date
                )));
            }
            if date == current.end_date + Duration::days(1) {
                current.end_date = date;
                if spread.value() < current.min_spread.value() {
                    current.min_spread = spread;
                }
                continue;
            }
        }
        intervals.push(AlignmentInterval::single(date, spread));
    }

    Ok(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn deg(v: f64) -> qtty::Degrees {
        qtty::Degrees::new(v)
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_intervals(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_three_consecutive_days_keep_minimum() {
        let merged = merge_intervals(&[
            (date(2026, 5, 15), deg(9.0)),
            (date(2026, 5, 16), deg(7.0)),
            (date(2026, 5, 17), deg(8.0)),
        ])
        .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start_date, date(2026, 5, 15));
        assert_eq!(merged[0].end_date, date(2026, 5, 17));
        assert_eq!(merged[0].min_spread.value(), 7.0);
        assert_eq!(
            merged[0].to_string(),
            "2026-05-15 〜 2026-05-17  span<= 7.00°"
        );
    }

    #[test]
    fn test_may_run_reports_smallest_spread() {
        let merged = merge_intervals(&[
            (date(2026, 5, 15), deg(8.45)),
            (date(2026, 5, 16), deg(7.0)),
            (date(2026, 5, 17), deg(8.0)),
        ])
        .unwrap();
        assert_eq!(
            merged,
            vec![AlignmentInterval {
                start_date: date(2026, 5, 15),
                end_date: date(2026, 5, 17),
                min_spread: deg(7.0),
            }]
        );
    }

    #[test]
    fn test_dates_five_days_apart_stay_separate() {
        let merged = merge_intervals(&[
            (date(2026, 5, 15), deg(4.0)),
            (date(2026, 5, 20), deg(6.5)),
        ])
        .unwrap();
        assert_eq!(
            merged,
            vec![
                AlignmentInterval::single(date(2026, 5, 15), deg(4.0)),
                AlignmentInterval::single(date(2026, 5, 20), deg(6.5)),
            ]
        );
        assert_eq!(merged[1].to_string(), "2026-05-20  span<= 6.50°");
    }

    #[test]
    fn test_single_day() {
        let merged = merge_intervals(&[(date(2027, 3, 22), deg(4.25))]).unwrap();
        assert_eq!(merged.len(), 1);
        assert!(merged[0].is_single_day());
        assert_eq!(merged[0].to_string(), "2027-03-22  span<= 4.25°");
    }

    #[test]
    fn test_gap_splits_intervals() {
        let merged = merge_intervals(&[
            (date(2026, 1, 1), deg(5.0)),
            (date(2026, 1, 3), deg(6.0)),
        ])
        .unwrap();
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(AlignmentInterval::is_single_day));
        assert!(merged[0].end_date < merged[1].start_date);
    }

    #[test]
    fn test_month_boundary_is_consecutive() {
        let merged = merge_intervals(&[
            (date(2028, 2, 28), deg(3.0)),
            (date(2028, 2, 29), deg(2.0)),
            (date(2028, 3, 1), deg(2.5)),
        ])
        .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].len_days(), 3);
        assert_eq!(merged[0].min_spread.value(), 2.0);
    }

    #[test]
    fn test_unsorted_input_is_domain_error() {
        let result = merge_intervals(&[
            (date(2026, 1, 3), deg(5.0)),
            (date(2026, 1, 1), deg(6.0)),
        ]);
        assert!(matches!(result, Err(AlignmentError::Domain(_))));
    }

    #[test]
    fn test_duplicate_date_is_domain_error() {
        let result = merge_intervals(&[
            (date(2026, 1, 1), deg(5.0)),
            (date(2026, 1, 1), deg(6.0)),
        ]);
        assert!(matches!(result, Err(AlignmentError::Domain(_))));
    }
}
