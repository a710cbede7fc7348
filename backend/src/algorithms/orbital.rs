//! Mean-motion orbital model.
//!
//! Longitudes are propagated linearly from a reference epoch:
//!
//! ```text
//! L(t) = L0 + n * (t - t0)        (mod 360)
//! ```
//!
//! with the mean motion `n` from Kepler's third law in the heliocentric
//! two-body approximation. No geocentric correction is applied by
//! [`predicted_longitude`]; the error against true geocentric longitudes is
//! absorbed by the candidate margin and removed by verification against
//! observed data. [`OrbitalModel::predicted_geocentric_longitude`] narrows that
//! error by viewing circular coplanar orbits from the observer's orbit.

use serde::{Deserialize, Serialize};

use super::angles::normalize_degrees;
use crate::error::{AlignmentError, AlignmentResult};
use crate::models::{Body, JulianDate, LongitudeSample, LongitudeSource, OrbitSize};

/// Gaussian gravitational constant k (rad/day, AU^(3/2)).
pub const GAUSSIAN_GRAVITATIONAL_CONSTANT: f64 = 0.017_202_098_95;

/// Heliocentric gravitational parameter in km^3/s^2.
pub const MU_SUN_KM3_S2: f64 = 132_712_440_041.939_38;

/// Astronomical unit in km (IAU 2012).
pub const AU_KM: f64 = 149_597_870.700;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Mean angular speed of a body, degrees/day. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MeanMotion(f64);

impl MeanMotion {
    pub fn new(deg_per_day: f64) -> AlignmentResult<Self> {
        if deg_per_day.is_finite() && deg_per_day > 0.0 {
            Ok(Self(deg_per_day))
        } else {
            Err(AlignmentError::model(format!(
                "mean motion must be positive and finite, got {}",
                deg_per_day
            )))
        }
    }

    pub fn deg_per_day(&self) -> f64 {
        self.0
    }

    /// Orbital period in days.
    pub fn period_days(&self) -> f64 {
        360.0 / self.0
    }
}

/// Mean motion from the semi-major axis (AU), degrees/day.
pub fn mean_motion(semi_major_axis_au: f64) -> AlignmentResult<MeanMotion> {
    if !(semi_major_axis_au.is_finite() && semi_major_axis_au > 0.0) {
        return Err(AlignmentError::model(format!(
            "semi-major axis must be positive, got {} AU",
            semi_major_axis_au
        )));
    }
    MeanMotion::new(GAUSSIAN_GRAVITATIONAL_CONSTANT.to_degrees() / semi_major_axis_au.powf(1.5))
}

/// Mean motion from the semi-major axis in km using the solar GM, degrees/day.
pub fn mean_motion_km(semi_major_axis_km: f64) -> AlignmentResult<MeanMotion> {
    if !(semi_major_axis_km.is_finite() && semi_major_axis_km > 0.0) {
        return Err(AlignmentError::model(format!(
            "semi-major axis must be positive, got {} km",
            semi_major_axis_km
        )));
    }
    let rad_per_day = (MU_SUN_KM3_S2 / semi_major_axis_km.powi(3)).sqrt() * SECONDS_PER_DAY;
    MeanMotion::new(rad_per_day.to_degrees())
}

/// Mean motion from a known orbital period (days), degrees/day.
pub fn mean_motion_from_period(period_days: f64) -> AlignmentResult<MeanMotion> {
    if !(period_days.is_finite() && period_days > 0.0) {
        return Err(AlignmentError::model(format!(
            "orbital period must be positive, got {} days",
            period_days
        )));
    }
    MeanMotion::new(360.0 / period_days)
}

/// Kepler's third law: period (days) of an orbit with the given axis (AU).
pub fn period_from_semi_major_axis(semi_major_axis_au: f64) -> f64 {
    std::f64::consts::TAU / GAUSSIAN_GRAVITATIONAL_CONSTANT * semi_major_axis_au.powf(1.5)
}

/// Kepler's third law: semi-major axis (AU) of an orbit with the given period (days).
pub fn semi_major_axis_from_period(period_days: f64) -> f64 {
    (period_days * GAUSSIAN_GRAVITATIONAL_CONSTANT / std::f64::consts::TAU).powf(2.0 / 3.0)
}

/// Mean motion of a body from whichever orbit size it carries.
pub fn body_mean_motion(body: &Body) -> AlignmentResult<MeanMotion> {
    match body.orbit {
        OrbitSize::SemiMajorAxisAu(a) => mean_motion(a),
        OrbitSize::PeriodDays(t) => mean_motion_from_period(t),
    }
    .map_err(|e| match e {
        AlignmentError::ModelInconsistency(msg) => {
            AlignmentError::model(format!("{}: {}", body.id, msg))
        }
        other => other,
    })
}

/// Predicted mean ecliptic longitude of `body` at `epoch`, degrees in [0, 360).
pub fn predicted_longitude(body: &Body, epoch: JulianDate) -> AlignmentResult<f64> {
    let n = body_mean_motion(body)?;
    Ok(propagate(
        body.reference_mean_longitude_deg,
        n,
        epoch.days_since(body.reference_epoch),
    ))
}

fn propagate(reference_longitude_deg: f64, n: MeanMotion, elapsed_days: f64) -> f64 {
    normalize_degrees(reference_longitude_deg + n.deg_per_day() * elapsed_days)
}

/// How predicted longitudes are projected before their spread is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// Uncorrected heliocentric mean longitude.
    Heliocentric,
    /// Direction from the observer's circular orbit to the body's circular orbit.
    #[default]
    Geocentric,
}

/// Inclusive bounds on the rate of change of a projected longitude, degrees/day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateBounds {
    pub lo: f64,
    pub hi: f64,
}

#[derive(Debug, Clone)]
struct ModelEntry {
    reference_longitude_deg: f64,
    reference_epoch: JulianDate,
    mean_motion: MeanMotion,
    semi_major_axis_au: f64,
}

impl ModelEntry {
    fn build(body: &Body) -> AlignmentResult<Self> {
        Ok(Self {
            reference_longitude_deg: body.reference_mean_longitude_deg,
            reference_epoch: body.reference_epoch,
            mean_motion: body_mean_motion(body)?,
            semi_major_axis_au: body.semi_major_axis_au()?,
        })
    }

    fn heliocentric(&self, epoch: JulianDate) -> f64 {
        propagate(
            self.reference_longitude_deg,
            self.mean_motion,
            epoch.days_since(self.reference_epoch),
        )
    }

    /// Orbital speed in AU·deg/day.
    fn speed(&self) -> f64 {
        self.semi_major_axis_au * self.mean_motion.deg_per_day()
    }
}

/// Precomputed mean motions for a fixed body set, plus an optional observer.
///
/// Built once at startup; construction fails with `ModelInconsistency` when any
/// body yields an invalid mean motion or shares the observer's orbit.
#[derive(Debug, Clone)]
pub struct OrbitalModel {
    ids: Vec<String>,
    entries: Vec<ModelEntry>,
    observer: Option<ModelEntry>,
}

impl OrbitalModel {
    /// Heliocentric model over `bodies`.
    pub fn new(bodies: &[Body]) -> AlignmentResult<Self> {
        let entries = bodies
            .iter()
            .map(ModelEntry::build)
            .collect::<AlignmentResult<Vec<_>>>()?;
        Ok(Self {
            ids: bodies.iter().map(|b| b.id.clone()).collect(),
            entries,
            observer: None,
        })
    }

    /// Model that can also project onto the sky of `observer`.
    pub fn with_observer(bodies: &[Body], observer: &Body) -> AlignmentResult<Self> {
        let mut model = Self::new(bodies)?;
        let obs = ModelEntry::build(observer)?;
        for (id, entry) in model.ids.iter().zip(&model.entries) {
            if (entry.semi_major_axis_au - obs.semi_major_axis_au).abs() < 1e-6 {
                return Err(AlignmentError::model(format!(
                    "{} shares the observer orbit of {}",
                    id, observer.id
                )));
            }
        }
        model.observer = Some(obs);
        Ok(model)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn body_ids(&self) -> &[String] {
        &self.ids
    }

    pub fn mean_motions(&self) -> Vec<MeanMotion> {
        self.entries.iter().map(|e| e.mean_motion).collect()
    }

    /// Projected longitudes at `epoch` tagged as predicted samples.
    pub fn predicted_samples(
        &self,
        projection: Projection,
        epoch: JulianDate,
    ) -> Vec<LongitudeSample> {
        self.ids
            .iter()
            .zip(self.projected_longitudes(projection, epoch))
            .map(|(id, longitude)| LongitudeSample {
                body: id.clone(),
                epoch,
                longitude: qtty::Degrees::new(longitude),
                source: LongitudeSource::Predicted,
            })
            .collect()
    }

    /// Heliocentric mean longitude of body `index` at `epoch`.
    pub fn predicted_longitude(&self, index: usize, epoch: JulianDate) -> f64 {
        self.entries[index].heliocentric(epoch)
    }

    /// Longitude of body `index` seen from the observer, both on circular
    /// coplanar orbits. Falls back to the heliocentric value without observer.
    pub fn predicted_geocentric_longitude(&self, index: usize, epoch: JulianDate) -> f64 {
        let body = &self.entries[index];
        let Some(observer) = &self.observer else {
            return body.heliocentric(epoch);
        };
        let lb = body.heliocentric(epoch).to_radians();
        let lo = observer.heliocentric(epoch).to_radians();
        let x = body.semi_major_axis_au * lb.cos() - observer.semi_major_axis_au * lo.cos();
        let y = body.semi_major_axis_au * lb.sin() - observer.semi_major_axis_au * lo.sin();
        normalize_degrees(y.atan2(x).to_degrees())
    }

    /// All projected longitudes at `epoch`.
    pub fn projected_longitudes(&self, projection: Projection, epoch: JulianDate) -> Vec<f64> {
        (0..self.entries.len())
            .map(|i| match projection {
                Projection::Heliocentric => self.predicted_longitude(i, epoch),
                Projection::Geocentric => self.predicted_geocentric_longitude(i, epoch),
            })
            .collect()
    }

    /// Rate bounds of body `index` under `projection`.
    ///
    /// Heliocentric longitudes move at exactly `n`. Seen from the observer the
    /// apparent rate is bounded by the relative orbital speed over the minimum
    /// distance between the two circular orbits.
    pub fn rate_bounds(&self, index: usize, projection: Projection) -> RateBounds {
        let body = &self.entries[index];
        match (projection, &self.observer) {
            (Projection::Geocentric, Some(observer)) => {
                let min_distance = (body.semi_major_axis_au - observer.semi_major_axis_au).abs();
                let bound = (body.speed() + observer.speed()) / min_distance;
                RateBounds {
                    lo: -bound,
                    hi: bound,
                }
            }
            _ => {
                let n = body.mean_motion.deg_per_day();
                RateBounds { lo: n, hi: n }
            }
        }
    }

    /// Upper bound on how fast the spread of all projected longitudes can change,
    /// degrees/day: `max(hi) - min(lo)`.
    pub fn spread_rate_bound(&self, projection: Projection) -> f64 {
        let (lo, hi) = (0..self.entries.len())
            .map(|i| self.rate_bounds(i, projection))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
                (lo.min(r.lo), hi.max(r.hi))
            });
        if lo.is_finite() && hi.is_finite() {
            (hi - lo).max(0.0)
        } else {
            0.0
        }
    }
}
