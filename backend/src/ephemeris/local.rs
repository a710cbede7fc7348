//! In-memory ephemeris for offline runs and tests.
//!
//! Longitudes are keyed by body and civil day. Bodies without a canned value
//! can fall back to the circular-orbit geocentric model of the planet catalog,
//! and failures can be injected per body/day to exercise the skip path.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::client::EphemerisClient;
use super::error::{EphemerisError, EphemerisResult, ErrorContext};
use crate::algorithms::angles::normalize_degrees;
use crate::algorithms::orbital::{predicted_longitude, OrbitalModel};
use crate::models::{JulianDate, OrbitalElements, Planet};

/// Failure to return for a body/day instead of a longitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectedFailure {
    /// Retryable transport error for the next `n` requests, then success.
    Transient(u32),
    /// Retryable transport error on every request.
    Persistent,
    /// Non-retryable: body/day outside the service range.
    Unsupported,
}

/// One canned observation in a fixture file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureLongitude {
    pub body: String,
    pub date: NaiveDate,
    pub longitude: f64,
}

/// JSON fixture accepted by [`LocalEphemeris::from_fixture`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EphemerisFixture {
    #[serde(default)]
    pub elements: HashMap<String, OrbitalElements>,
    #[serde(default)]
    pub longitudes: Vec<FixtureLongitude>,
    /// Serve catalog planets from the nominal circular model when no canned value exists.
    #[serde(default)]
    pub synthesize: bool,
}

#[derive(Debug, Default)]
struct LocalState {
    longitudes: HashMap<(String, NaiveDate), f64>,
    elements: HashMap<String, OrbitalElements>,
    failures: HashMap<(String, NaiveDate), InjectedFailure>,
}

/// In-memory [`EphemerisClient`].
#[derive(Debug, Default)]
pub struct LocalEphemeris {
    state: RwLock<LocalState>,
    synthesize: bool,
    requests: AtomicU64,
}

/// Catalog planets are stored under their name whatever alias the caller uses.
fn body_key(body_id: &str) -> String {
    match Planet::from_str(body_id) {
        Ok(planet) => planet.name().to_string(),
        Err(_) => body_id.trim().to_string(),
    }
}

impl LocalEphemeris {
    /// Empty client; every request fails as unsupported.
    pub fn new() -> Self {
        Self::default()
    }

    /// Client that answers for every catalog planet from the nominal elements.
    pub fn synthetic() -> Self {
        Self {
            synthesize: true,
            ..Self::default()
        }
    }

    /// Load canned data from a JSON fixture file.
    pub fn from_fixture<P: AsRef<Path>>(path: P) -> EphemerisResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            EphemerisError::configuration(format!(
                "Failed to read fixture {}: {}",
                path.display(),
                e
            ))
        })?;
        let fixture: EphemerisFixture = serde_json::from_str(&content).map_err(|e| {
            EphemerisError::configuration(format!(
                "Failed to parse fixture {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::from_parts(fixture))
    }

    pub fn from_parts(fixture: EphemerisFixture) -> Self {
        let client = Self {
            synthesize: fixture.synthesize,
            ..Self::default()
        };
        {
            let mut state = client.state.write();
            for (body, elements) in fixture.elements {
                state.elements.insert(body_key(&body), elements);
            }
            for sample in fixture.longitudes {
                state.longitudes.insert(
                    (body_key(&sample.body), sample.date),
                    normalize_degrees(sample.longitude),
                );
            }
        }
        client
    }

    pub fn insert_longitude(&self, body_id: &str, date: NaiveDate, longitude_deg: f64) {
        self.state
            .write()
            .longitudes
            .insert((body_key(body_id), date), normalize_degrees(longitude_deg));
    }

    pub fn insert_elements(&self, body_id: &str, elements: OrbitalElements) {
        self.state.write().elements.insert(body_key(body_id), elements);
    }

    pub fn inject_failure(&self, body_id: &str, date: NaiveDate, failure: InjectedFailure) {
        self.state
            .write()
            .failures
            .insert((body_key(body_id), date), failure);
    }

    /// Number of requests served or failed so far.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Apply any injected failure for `key`, consuming one transient failure.
    fn check_failure(
        &self,
        key: &(String, NaiveDate),
        context: &ErrorContext,
    ) -> EphemerisResult<()> {
        let mut state = self.state.write();
        let current = match state.failures.get(key) {
            Some(failure) => *failure,
            None => return Ok(()),
        };
        match current {
            InjectedFailure::Transient(0) => {
                state.failures.remove(key);
                Ok(())
            }
            InjectedFailure::Transient(n) => {
                state
                    .failures
                    .insert(key.clone(), InjectedFailure::Transient(n - 1));
                Err(EphemerisError::transport(
                    "injected transient failure",
                    context.clone(),
                ))
            }
            InjectedFailure::Persistent => Err(EphemerisError::transport(
                "injected persistent failure",
                context.clone(),
            )),
            InjectedFailure::Unsupported => Err(EphemerisError::unsupported(
                "no data for body on this date",
                context.clone(),
            )),
        }
    }

    fn synthesized_longitude(&self, key: &str, epoch: JulianDate) -> Option<f64> {
        if !self.synthesize {
            return None;
        }
        let planet = Planet::from_str(key).ok()?;
        let earth = Planet::Earth.nominal_body();
        // Fails for Earth itself, which has no geocentric longitude.
        OrbitalModel::with_observer(&[planet.nominal_body()], &earth)
            .ok()
            .map(|model| model.predicted_geocentric_longitude(0, epoch))
    }
}

#[async_trait]
impl EphemerisClient for LocalEphemeris {
    async fn get_longitude(&self, body_id: &str, epoch: JulianDate) -> EphemerisResult<f64> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let context = ErrorContext::new("get_longitude")
            .with_body(body_id)
            .with_epoch(epoch.value());
        let key = (body_key(body_id), epoch.to_date());

        self.check_failure(&key, &context)?;

        if let Some(longitude) = self.state.read().longitudes.get(&key).copied() {
            return Ok(longitude);
        }
        self.synthesized_longitude(&key.0, epoch).ok_or_else(|| {
            EphemerisError::unsupported("no canned longitude for body on this date", context)
        })
    }

    async fn get_elements(
        &self,
        body_id: &str,
        epoch: JulianDate,
    ) -> EphemerisResult<OrbitalElements> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let key = body_key(body_id);

        if let Some(elements) = self.state.read().elements.get(&key).copied() {
            return Ok(elements);
        }
        if self.synthesize {
            if let Ok(planet) = Planet::from_str(&key) {
                let nominal = planet.nominal_body();
                let longitude = predicted_longitude(&nominal, epoch).map_err(|e| {
                    EphemerisError::internal(
                        e.to_string(),
                        ErrorContext::new("get_elements").with_body(body_id),
                    )
                })?;
                return Ok(OrbitalElements {
                    semi_major_axis_au: planet.nominal_semi_major_axis_au(),
                    reference_mean_longitude_deg: longitude,
                    reference_epoch: epoch,
                });
            }
        }
        Err(EphemerisError::unsupported(
            "no elements for body",
            ErrorContext::new("get_elements")
                .with_body(body_id)
                .with_epoch(epoch.value()),
        ))
    }

    async fn health_check(&self) -> EphemerisResult<bool> {
        Ok(true)
    }
}
