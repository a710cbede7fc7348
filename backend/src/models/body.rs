//! Bodies, orbital elements and the built-in planet catalog.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::time::JulianDate;
use crate::error::{AlignmentError, AlignmentResult};

/// Major planets known to the scanner, with their JPL Horizons command ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Planet {
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
}

impl Planet {
    pub const ALL: [Planet; 8] = [
        Planet::Mercury,
        Planet::Venus,
        Planet::Earth,
        Planet::Mars,
        Planet::Jupiter,
        Planet::Saturn,
        Planet::Uranus,
        Planet::Neptune,
    ];

    /// Planets usually considered for alignments (Earth is the observer).
    pub const ALIGNABLE: [Planet; 7] = [
        Planet::Mercury,
        Planet::Venus,
        Planet::Mars,
        Planet::Jupiter,
        Planet::Saturn,
        Planet::Uranus,
        Planet::Neptune,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Planet::Mercury => "Mercury",
            Planet::Venus => "Venus",
            Planet::Earth => "Earth",
            Planet::Mars => "Mars",
            Planet::Jupiter => "Jupiter",
            Planet::Saturn => "Saturn",
            Planet::Uranus => "Uranus",
            Planet::Neptune => "Neptune",
        }
    }

    /// Horizons major-body COMMAND id.
    pub fn horizons_id(&self) -> &'static str {
        match self {
            Planet::Mercury => "199",
            Planet::Venus => "299",
            Planet::Earth => "399",
            Planet::Mars => "499",
            Planet::Jupiter => "599",
            Planet::Saturn => "699",
            Planet::Uranus => "799",
            Planet::Neptune => "899",
        }
    }

    /// Nominal semi-major axis in AU (J2000 mean elements).
    pub fn nominal_semi_major_axis_au(&self) -> f64 {
        match self {
            Planet::Mercury => 0.387_098_93,
            Planet::Venus => 0.723_331_99,
            Planet::Earth => 1.000_002_61,
            Planet::Mars => 1.523_662_31,
            Planet::Jupiter => 5.203_363_01,
            Planet::Saturn => 9.537_070_32,
            Planet::Uranus => 19.191_263_93,
            Planet::Neptune => 30.068_963_48,
        }
    }

    /// Nominal J2000 mean longitude in degrees.
    pub fn nominal_mean_longitude_deg(&self) -> f64 {
        match self {
            Planet::Mercury => 252.250_84,
            Planet::Venus => 181.979_73,
            Planet::Earth => 100.464_35,
            Planet::Mars => 355.453_32,
            Planet::Jupiter => 34.404_38,
            Planet::Saturn => 49.944_32,
            Planet::Uranus => 313.232_18,
            Planet::Neptune => 304.880_03,
        }
    }

    /// Default allowance (degrees) for the gap between the circular mean-motion
    /// prediction and the true geocentric longitude. Dominated by eccentricity,
    /// amplified by proximity to Earth.
    pub fn default_tolerance_deg(&self) -> f64 {
        match self {
            Planet::Mercury => 25.0,
            Planet::Venus => 12.0,
            Planet::Earth => 2.0,
            Planet::Mars => 50.0,
            Planet::Jupiter => 8.0,
            Planet::Saturn => 8.0,
            Planet::Uranus => 6.0,
            Planet::Neptune => 2.0,
        }
    }

    /// Reference body built from the nominal J2000 elements.
    pub fn nominal_body(&self) -> Body {
        Body::new(
            self.name(),
            OrbitSize::SemiMajorAxisAu(self.nominal_semi_major_axis_au()),
            self.nominal_mean_longitude_deg(),
            JulianDate::new(crate::models::J2000_JD),
        )
        .with_tolerance(self.default_tolerance_deg())
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Planet {
    type Err = AlignmentError;

    /// Case-insensitive lookup by name or Horizons id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Planet::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(needle) || p.horizons_id() == needle)
            .ok_or_else(|| {
                let available: Vec<&str> = Planet::ALL.iter().map(|p| p.name()).collect();
                AlignmentError::domain(format!(
                    "Unknown planet name: {}. Available: {}",
                    s,
                    available.join(", ")
                ))
            })
    }
}

/// Orbit size: either of the two quantities Kepler's third law links.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrbitSize {
    SemiMajorAxisAu(f64),
    PeriodDays(f64),
}

/// Osculating elements as reported by the ephemeris service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub semi_major_axis_au: f64,
    pub reference_mean_longitude_deg: f64,
    pub reference_epoch: JulianDate,
}

/// A body with the reference elements used for linear propagation.
///
/// Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: String,
    pub orbit: OrbitSize,
    pub reference_mean_longitude_deg: f64,
    pub reference_epoch: JulianDate,
    /// Allowance between predicted and true longitude used for candidate margins.
    #[serde(default)]
    pub tolerance_deg: f64,
}

impl Body {
    pub fn new(
        id: impl Into<String>,
        orbit: OrbitSize,
        reference_mean_longitude_deg: f64,
        reference_epoch: JulianDate,
    ) -> Self {
        Self {
            id: id.into(),
            orbit,
            reference_mean_longitude_deg,
            reference_epoch,
            tolerance_deg: 0.0,
        }
    }

    pub fn from_elements(id: impl Into<String>, elements: &OrbitalElements) -> Self {
        Self::new(
            id,
            OrbitSize::SemiMajorAxisAu(elements.semi_major_axis_au),
            elements.reference_mean_longitude_deg,
            elements.reference_epoch,
        )
    }

    pub fn with_tolerance(mut self, tolerance_deg: f64) -> Self {
        self.tolerance_deg = tolerance_deg;
        self
    }

    /// Semi-major axis in AU, derived from the period when only that is known.
    pub fn semi_major_axis_au(&self) -> AlignmentResult<f64> {
        match self.orbit {
            OrbitSize::SemiMajorAxisAu(a) if a.is_finite() && a > 0.0 => Ok(a),
            OrbitSize::PeriodDays(t) if t.is_finite() && t > 0.0 => {
                Ok(crate::algorithms::orbital::semi_major_axis_from_period(t))
            }
            other => Err(AlignmentError::model(format!(
                "Body {} has invalid orbit size {:?}",
                self.id, other
            ))),
        }
    }
}
