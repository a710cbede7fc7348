//! True-data verification of a single date.

use std::sync::Arc;

use chrono::NaiveDate;
use log::warn;

use crate::algorithms::angles::{circular_min_spread, normalize_degrees};
use crate::ephemeris::{EphemerisClient, EphemerisError, ErrorContext};
use crate::error::{AlignmentError, AlignmentResult};
use crate::models::{Body, JulianDate, LongitudeSample, LongitudeSource, SkippedDate, SpreadResult};

/// Outcome of verifying one date.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// Observed spread; `passed` tells whether it met the threshold.
    Verified(SpreadResult),
    /// The collaborator could not answer; neither pass nor fail.
    Unverifiable(SkippedDate),
}

impl Verification {
    pub fn date(&self) -> NaiveDate {
        match self {
            Verification::Verified(result) => result.date,
            Verification::Unverifiable(skipped) => skipped.date,
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Verification::Verified(result) if result.passed)
    }
}

/// Fetches observed longitudes for a fixed body set and checks the spread.
pub struct AlignmentVerifier {
    client: Arc<dyn EphemerisClient>,
    body_ids: Vec<String>,
    threshold_deg: f64,
}

impl AlignmentVerifier {
    pub fn new(
        client: Arc<dyn EphemerisClient>,
        bodies: &[Body],
        threshold_deg: f64,
    ) -> AlignmentResult<Self> {
        if bodies.len() < 2 {
            return Err(AlignmentError::domain(format!(
                "verification needs at least 2 bodies, got {}",
                bodies.len()
            )));
        }
        if !(threshold_deg.is_finite() && threshold_deg > 0.0) {
            return Err(AlignmentError::domain(format!(
                "threshold must be positive, got {}",
                threshold_deg
            )));
        }
        Ok(Self {
            client,
            body_ids: bodies.iter().map(|b| b.id.clone()).collect(),
            threshold_deg,
        })
    }

    pub fn threshold_deg(&self) -> f64 {
        self.threshold_deg
    }

    pub fn body_ids(&self) -> &[String] {
        &self.body_ids
    }

    /// Query every body at 00:00 UTC on `date` and measure the spread.
    ///
    /// Collaborator failures (after the retry layer gave up) turn into
    /// [`Verification::Unverifiable`] and are logged; they never fail the call.
    pub async fn verify(&self, date: NaiveDate) -> AlignmentResult<Verification> {
        let epoch = JulianDate::from_date(date);
        let longitudes = match self.client.get_longitudes(&self.body_ids, epoch).await {
            Ok(longitudes) => longitudes,
            Err(source) => return Ok(Verification::Unverifiable(self.skip(date, source))),
        };

        if longitudes.len() != self.body_ids.len() {
            let source = EphemerisError::malformed(
                format!(
                    "expected {} longitudes, got {}",
                    self.body_ids.len(),
                    longitudes.len()
                ),
                ErrorContext::new("get_longitudes").with_epoch(epoch.value()),
            );
            return Ok(Verification::Unverifiable(self.skip(date, source)));
        }
        if let Some(index) = longitudes.iter().position(|l| !l.is_finite()) {
            let source = EphemerisError::malformed(
                "non-finite longitude",
                ErrorContext::new("get_longitudes")
                    .with_body(self.body_ids[index].clone())
                    .with_epoch(epoch.value()),
            );
            return Ok(Verification::Unverifiable(self.skip(date, source)));
        }

        Ok(Verification::Verified(self.evaluate(date, &longitudes)?))
    }

    /// Spread of already-observed longitudes, in body order.
    pub fn evaluate(&self, date: NaiveDate, longitudes: &[f64]) -> AlignmentResult<SpreadResult> {
        let spread = circular_min_spread(longitudes)?;
        let epoch = JulianDate::from_date(date);
        let samples = self
            .body_ids
            .iter()
            .zip(longitudes)
            .map(|(id, lon)| LongitudeSample {
                body: id.clone(),
                epoch,
                longitude: qtty::Degrees::new(normalize_degrees(*lon)),
                source: LongitudeSource::Observed,
            })
            .collect();

        Ok(SpreadResult {
            date,
            spread: qtty::Degrees::new(spread),
            longitudes: samples,
            passed: spread <= self.threshold_deg,
        })
    }

    fn skip(&self, date: NaiveDate, source: EphemerisError) -> SkippedDate {
        let body = source
            .context()
            .body
            .clone()
            .unwrap_or_else(|| self.body_ids.join(","));
        let error = AlignmentError::DataUnavailable {
            date,
            body: body.clone(),
            source,
        };
        warn!("skipping {}: {}", date, error);
        SkippedDate {
            date,
            body,
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::{InjectedFailure, LocalEphemeris};
    use crate::models::Planet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bodies() -> Vec<Body> {
        vec![
            Planet::Mars.nominal_body(),
            Planet::Jupiter.nominal_body(),
            Planet::Saturn.nominal_body(),
        ]
    }

    #[tokio::test]
    async fn test_verify_pass_and_fail() {
        let local = Arc::new(LocalEphemeris::new());
        let day = date(2026, 5, 15);
        local.insert_longitude("Mars", day, 355.0);
        local.insert_longitude("Jupiter", day, 2.0);
        local.insert_longitude("Saturn", day, 1.0);
        let next = date(2026, 5, 16);
        local.insert_longitude("Mars", next, 0.0);
        local.insert_longitude("Jupiter", next, 90.0);
        local.insert_longitude("Saturn", next, 45.0);

        let verifier = AlignmentVerifier::new(local, &bodies(), 10.0).unwrap();

        let Verification::Verified(result) = verifier.verify(day).await.unwrap() else {
            panic!("expected a verified date");
        };
        assert!((result.spread.value() - 7.0).abs() < 1e-9);
        assert!(result.passed);
        assert_eq!(result.longitudes.len(), 3);
        assert!(result
            .longitudes
            .iter()
            .all(|s| s.source == LongitudeSource::Observed));

        let outcome = verifier.verify(next).await.unwrap();
        assert!(!outcome.passed());
        assert_eq!(outcome.date(), next);
    }

    #[tokio::test]
    async fn test_collaborator_failure_is_unverifiable() {
        let local = Arc::new(LocalEphemeris::synthetic());
        let day = date(2026, 5, 15);
        local.inject_failure("Jupiter", day, InjectedFailure::Unsupported);

        let verifier = AlignmentVerifier::new(local, &bodies(), 10.0).unwrap();
        let Verification::Unverifiable(skipped) = verifier.verify(day).await.unwrap() else {
            panic!("expected the date to be skipped");
        };
        assert_eq!(skipped.date, day);
        assert_eq!(skipped.body, "Jupiter");
        assert!(skipped.reason.contains("Data unavailable"));
    }

    #[test]
    fn test_fewer_than_two_bodies_is_domain_error() {
        let local: Arc<dyn EphemerisClient> = Arc::new(LocalEphemeris::synthetic());
        let result = AlignmentVerifier::new(local, &[Planet::Mars.nominal_body()], 10.0);
        assert!(matches!(result, Err(AlignmentError::Domain(_))));
    }

    #[test]
    fn test_non_positive_threshold_is_domain_error() {
        let local: Arc<dyn EphemerisClient> = Arc::new(LocalEphemeris::synthetic());
        let result = AlignmentVerifier::new(local, &bodies(), -3.0);
        assert!(matches!(result, Err(AlignmentError::Domain(_))));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let local: Arc<dyn EphemerisClient> = Arc::new(LocalEphemeris::new());
        let verifier = AlignmentVerifier::new(local, &bodies(), 20.0).unwrap();
        let result = verifier
            .evaluate(date(2026, 1, 1), &[10.0, 20.0, 30.0])
            .unwrap();
        assert!((result.spread.value() - 20.0).abs() < 1e-9);
        assert!(result.passed);
    }
}
