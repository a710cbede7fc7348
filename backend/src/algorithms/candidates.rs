//! Analytic candidate-date prediction.
//!
//! The predicted spread `S(t)` of all projected longitudes cannot change faster
//! than `R = max(hi) - min(lo)` degrees/day, where `[lo, hi]` are the per-body
//! rate bounds of the orbital model. When `S(t)` is above the margin `M`, no day
//! before `t + (S(t) - M) / R` can fall back under it, so the walk jumps ahead
//! by `floor((S(t) - M) / R)` days. Every day whose predicted spread is within
//! the margin is emitted; the output is exactly the set a dense day-by-day
//! evaluation of the same predicate would produce.
//!
//! The margin is `threshold * margin_factor + e1 + e2`, with `e1`, `e2` the two
//! largest per-body tolerances: if each predicted longitude is within `e_i` of
//! the true one, the predicted spread exceeds the true spread by at most the two
//! largest errors.

use chrono::{Duration, NaiveDate};
use log::{debug, log_enabled, trace, Level};
use serde::{Deserialize, Serialize};

use super::angles::circular_min_spread;
use super::orbital::{OrbitalModel, Projection};
use crate::error::{AlignmentError, AlignmentResult};
use crate::models::{Body, JulianDate, LongitudeSample, ScanWindow};

/// Default multiplier applied to the threshold before tolerances are added.
pub const DEFAULT_MARGIN_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateSettings {
    pub threshold_deg: f64,
    pub margin_factor: f64,
    pub projection: Projection,
}

impl CandidateSettings {
    pub fn new(threshold_deg: f64) -> Self {
        Self {
            threshold_deg,
            margin_factor: DEFAULT_MARGIN_FACTOR,
            projection: Projection::default(),
        }
    }

    pub fn with_margin_factor(mut self, margin_factor: f64) -> Self {
        self.margin_factor = margin_factor;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }
}

/// Work done by one generation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateStats {
    pub window_days: usize,
    pub candidates: usize,
    pub evaluations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSet {
    /// Ascending, deduplicated, inside the window.
    pub dates: Vec<NaiveDate>,
    pub stats: CandidateStats,
}

#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    model: OrbitalModel,
    settings: CandidateSettings,
    margin_deg: f64,
    spread_rate: f64,
}

impl CandidateGenerator {
    /// Build a generator for `bodies`.
    ///
    /// `observer` is required for geocentric projection.
    pub fn new(
        bodies: &[Body],
        observer: Option<&Body>,
        settings: CandidateSettings,
    ) -> AlignmentResult<Self> {
        if bodies.len() < 2 {
            return Err(AlignmentError::domain(format!(
                "candidate generation needs at least 2 bodies, got {}",
                bodies.len()
            )));
        }
        if !(settings.threshold_deg.is_finite() && settings.threshold_deg > 0.0) {
            return Err(AlignmentError::domain(format!(
                "threshold must be positive, got {}",
                settings.threshold_deg
            )));
        }
        if !(settings.margin_factor.is_finite() && settings.margin_factor >= 1.0) {
            return Err(AlignmentError::domain(format!(
                "margin factor must be >= 1, got {}",
                settings.margin_factor
            )));
        }
        if let Some(body) = bodies
            .iter()
            .find(|b| !(b.tolerance_deg.is_finite() && b.tolerance_deg >= 0.0))
        {
            return Err(AlignmentError::domain(format!(
                "tolerance for {} must be non-negative, got {}",
                body.id, body.tolerance_deg
            )));
        }

        let model = match (settings.projection, observer) {
            (Projection::Geocentric, Some(obs)) => OrbitalModel::with_observer(bodies, obs)?,
            (Projection::Geocentric, None) => {
                return Err(AlignmentError::domain(
                    "geocentric projection requires an observer body",
                ))
            }
            (Projection::Heliocentric, _) => OrbitalModel::new(bodies)?,
        };

        let mut tolerances: Vec<f64> = bodies.iter().map(|b| b.tolerance_deg).collect();
        tolerances.sort_by(|a, b| b.total_cmp(a));
        let margin_deg =
            settings.threshold_deg * settings.margin_factor + tolerances[0] + tolerances[1];
        let spread_rate = model.spread_rate_bound(settings.projection);

        debug!(
            "candidate generator: {} bodies, projection={:?}, margin={:.3}°, spread rate<={:.4}°/day",
            bodies.len(),
            settings.projection,
            margin_deg,
            spread_rate
        );

        Ok(Self {
            model,
            settings,
            margin_deg,
            spread_rate,
        })
    }

    pub fn settings(&self) -> &CandidateSettings {
        &self.settings
    }

    /// Predicted spread at or below which a day becomes a candidate.
    pub fn margin_deg(&self) -> f64 {
        self.margin_deg
    }

    /// Bound on the daily change of the predicted spread.
    pub fn spread_rate_bound(&self) -> f64 {
        self.spread_rate
    }

    /// Spread of the projected predicted longitudes at 00:00 UTC on `date`.
    pub fn predicted_spread(&self, date: NaiveDate) -> AlignmentResult<f64> {
        let longitudes = self
            .model
            .projected_longitudes(self.settings.projection, JulianDate::from_date(date));
        circular_min_spread(&longitudes)
    }

    /// Projected predicted longitudes on `date`; never used as a final answer.
    pub fn predicted_samples(&self, date: NaiveDate) -> Vec<LongitudeSample> {
        self.model
            .predicted_samples(self.settings.projection, JulianDate::from_date(date))
    }

    pub fn is_candidate(&self, date: NaiveDate) -> AlignmentResult<bool> {
        Ok(self.predicted_spread(date)? <= self.margin_deg)
    }

    /// Candidate dates in `window`.
    pub fn generate(&self, window: &ScanWindow) -> AlignmentResult<CandidateSet> {
        if window.start > window.end {
            return Err(AlignmentError::domain(format!(
                "scan window start {} is after end {}",
                window.start, window.end
            )));
        }

        let window_days = window.len();
        let mut dates = Vec::new();
        let mut evaluations = 0usize;
        let mut day = window.start;

        while day <= window.end {
            evaluations += 1;
            let spread = self.predicted_spread(day)?;

            let step = if spread <= self.margin_deg {
                if log_enabled!(Level::Trace) {
                    let samples: Vec<String> = self
                        .predicted_samples(day)
                        .iter()
                        .map(|s| format!("{}={:.2}", s.body, s.longitude.value()))
                        .collect();
                    trace!("candidate {}: spread {:.3}° [{}]", day, spread, samples.join(", "));
                }
                dates.push(day);
                1
            } else if self.spread_rate > 0.0 {
                let safe_days = ((spread - self.margin_deg) / self.spread_rate).floor();
                safe_days.clamp(1.0, window_days as f64) as i64
            } else {
                // Constant predicted spread above the margin.
                break;
            };

            match day.checked_add_signed(Duration::days(step)) {
                Some(next) => day = next,
                None => break,
            }
        }

        let stats = CandidateStats {
            window_days,
            candidates: dates.len(),
            evaluations,
        };
        debug!(
            "generated {} candidates from {} evaluations over {} days",
            stats.candidates, stats.evaluations, stats.window_days
        );

        Ok(CandidateSet { dates, stats })
    }
}

/// Candidate dates for `bodies` over `window`.
pub fn generate_candidates(
    bodies: &[Body],
    observer: Option<&Body>,
    window: &ScanWindow,
    settings: CandidateSettings,
) -> AlignmentResult<CandidateSet> {
    CandidateGenerator::new(bodies, observer, settings)?.generate(window)
}
