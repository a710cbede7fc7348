//! Daily spread series over a whole window, for plotting by an external tool.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::scan::ScanOrchestrator;
use super::verifier::{AlignmentVerifier, Verification};
use crate::error::{AlignmentError, AlignmentResult};
use crate::models::{Body, ScanWindow};

/// One day of the series. `spread` and `passed` are absent for skipped days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanSample {
    pub date: NaiveDate,
    pub spread: Option<qtty::Degrees>,
    pub passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_reason: Option<String>,
}

impl From<Verification> for SpanSample {
    fn from(verification: Verification) -> Self {
        match verification {
            Verification::Verified(result) => Self {
                date: result.date,
                spread: Some(result.spread),
                passed: Some(result.passed),
                skipped_reason: None,
            },
            Verification::Unverifiable(skipped) => Self {
                date: skipped.date,
                spread: None,
                passed: None,
                skipped_reason: Some(format!("{}: {}", skipped.body, skipped.reason)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanSeries {
    pub bodies: Vec<String>,
    pub threshold_deg: f64,
    /// One entry per day of the window, ascending.
    pub samples: Vec<SpanSample>,
}

impl SpanSeries {
    /// Smallest observed spread and its date.
    pub fn minimum(&self) -> Option<(NaiveDate, qtty::Degrees)> {
        self.samples
            .iter()
            .filter_map(|s| s.spread.map(|spread| (s.date, spread)))
            .min_by(|a, b| a.1.value().total_cmp(&b.1.value()))
    }

    pub fn skipped(&self) -> usize {
        self.samples.iter().filter(|s| s.spread.is_none()).count()
    }

    /// Tab-separated `date spread passed` rows; skipped days print `-`.
    pub fn to_tsv(&self) -> String {
        let mut out = String::from("date\tspread_deg\tpassed\n");
        for sample in &self.samples {
            match (sample.spread, sample.passed) {
                (Some(spread), Some(passed)) => {
                    out.push_str(&format!("{}\t{:.4}\t{}\n", sample.date, spread.value(), passed))
                }
                _ => out.push_str(&format!("{}\t-\t-\n", sample.date)),
            }
        }
        out
    }
}

/// Observed spread of `bodies` for every day in `window`.
///
/// # Errors
/// `Domain` for an invalid body set, threshold or window. Days the
/// collaborator cannot answer stay in the series without a spread.
pub async fn span_series(
    orchestrator: &ScanOrchestrator,
    bodies: &[Body],
    window: &ScanWindow,
    threshold_deg: f64,
) -> AlignmentResult<SpanSeries> {
    if window.start > window.end {
        return Err(AlignmentError::domain(format!(
            "scan window start {} is after end {}",
            window.start, window.end
        )));
    }
    let verifier = AlignmentVerifier::new(orchestrator.client().clone(), bodies, threshold_deg)?;
    let dates: Vec<NaiveDate> = window.days().collect();

    let results = orchestrator.verify_dates(&verifier, dates).await?;
    Ok(SpanSeries {
        bodies: verifier.body_ids().to_vec(),
        threshold_deg,
        samples: results.into_values().map(SpanSample::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::ephemeris::{InjectedFailure, LocalEphemeris};
    use crate::models::Planet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixture() -> Arc<LocalEphemeris> {
        let local = Arc::new(LocalEphemeris::new());
        for (day, sep) in [(1, 12.0), (2, 4.0), (3, 30.0)] {
            local.insert_longitude("Venus", date(2027, 3, day), 350.0);
            local.insert_longitude("Saturn", date(2027, 3, day), (350.0 + sep) % 360.0);
        }
        local
    }

    fn bodies() -> Vec<Body> {
        vec![Planet::Venus.nominal_body(), Planet::Saturn.nominal_body()]
    }

    #[tokio::test]
    async fn test_series_covers_every_day() {
        let orchestrator = ScanOrchestrator::new(fixture());
        let window = ScanWindow::new(date(2027, 3, 1), date(2027, 3, 3));
        let series = span_series(&orchestrator, &bodies(), &window, 5.0)
            .await
            .unwrap();

        assert_eq!(series.samples.len(), 3);
        assert_eq!(series.bodies, vec!["Venus".to_string(), "Saturn".to_string()]);
        let passed: Vec<_> = series.samples.iter().map(|s| s.passed).collect();
        assert_eq!(passed, vec![Some(false), Some(true), Some(false)]);

        let (day, spread) = series.minimum().unwrap();
        assert_eq!(day, date(2027, 3, 2));
        assert!((spread.value() - 4.0).abs() < 1e-9);
        assert_eq!(series.skipped(), 0);
    }

    #[tokio::test]
    async fn test_skipped_day_keeps_its_row() {
        let local = fixture();
        local.inject_failure("Venus", date(2027, 3, 2), InjectedFailure::Persistent);
        let orchestrator = ScanOrchestrator::new(local);
        let window = ScanWindow::new(date(2027, 3, 1), date(2027, 3, 3));

        let series = span_series(&orchestrator, &bodies(), &window, 5.0)
            .await
            .unwrap();
        assert_eq!(series.samples.len(), 3);
        assert_eq!(series.skipped(), 1);
        assert!(series.samples[1].spread.is_none());
        assert!(series.samples[1]
            .skipped_reason
            .as_deref()
            .unwrap()
            .starts_with("Venus"));

        let tsv = series.to_tsv();
        assert!(tsv.contains("2027-03-02\t-\t-"));
        assert!(tsv.contains("2027-03-01\t12.0000\tfalse"));
    }

    #[tokio::test]
    async fn test_inverted_window_is_domain_error() {
        let orchestrator = ScanOrchestrator::new(fixture());
        let window = ScanWindow::new(date(2027, 3, 3), date(2027, 3, 1));
        let err = span_series(&orchestrator, &bodies(), &window, 5.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AlignmentError::Domain(_)));
    }

    #[test]
    fn test_sample_serializes_plain_numbers() {
        let sample = SpanSample {
            date: date(2027, 3, 2),
            spread: Some(qtty::Degrees::new(4.5)),
            passed: Some(true),
            skipped_reason: None,
        };
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["date"], "2027-03-02");
        assert_eq!(json["spread"], 4.5);
        assert!(json.get("skipped_reason").is_none());
    }
}
