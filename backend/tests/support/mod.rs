#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;

use ecliptic_align::algorithms::angles::normalize_degrees;
use ecliptic_align::ephemeris::{
    EphemerisClient, EphemerisError, EphemerisResult, ErrorContext, LocalEphemeris,
};
use ecliptic_align::models::{JulianDate, OrbitalElements, Planet};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with the given variables set (`Some`) or removed (`None`), then
/// restores them, also on unwind. Serialized across tests in the binary.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::apply(changes);
    f()
}

/// Like [`with_scoped_env`], with the working directory moved to `dir` for
/// the duration of `f`.
pub fn with_scoped_cwd<F, R>(dir: &Path, changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _env = ScopedEnv::apply(changes);
    let _cwd = ScopedCwd::enter(dir);
    f()
}

struct ScopedCwd {
    previous: PathBuf,
}

impl ScopedCwd {
    fn enter(dir: &Path) -> Self {
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        Self { previous }
    }
}

impl Drop for ScopedCwd {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.previous);
    }
}

struct ScopedEnv {
    saved: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn apply(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let saved = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }
        Self { saved }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.saved.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Synthetic sky whose longitudes wander away from the circular model.
///
/// Each planet's offset is a slow sinusoid with amplitude `fraction` of its
/// catalog tolerance, so the candidate margin still covers the model error
/// when `fraction <= 1`.
pub struct PerturbedSky {
    base: LocalEphemeris,
    fraction: f64,
}

impl PerturbedSky {
    pub fn new(fraction: f64) -> Self {
        Self {
            base: LocalEphemeris::synthetic(),
            fraction,
        }
    }

    pub fn offset(&self, planet: Planet, epoch: JulianDate) -> f64 {
        let amplitude = planet.default_tolerance_deg() * self.fraction;
        let phase = planet as usize as f64 * 0.7;
        let period_days = 97.0 + 31.0 * planet as usize as f64;
        amplitude * (epoch.value() * std::f64::consts::TAU / period_days + phase).sin()
    }
}

#[async_trait]
impl EphemerisClient for PerturbedSky {
    async fn get_longitude(&self, body_id: &str, epoch: JulianDate) -> EphemerisResult<f64> {
        let planet = Planet::from_str(body_id).map_err(|e| {
            EphemerisError::unsupported(
                e.to_string(),
                ErrorContext::new("get_longitude").with_body(body_id),
            )
        })?;
        let longitude = self.base.get_longitude(body_id, epoch).await?;
        Ok(normalize_degrees(longitude + self.offset(planet, epoch)))
    }

    async fn get_elements(
        &self,
        body_id: &str,
        epoch: JulianDate,
    ) -> EphemerisResult<OrbitalElements> {
        self.base.get_elements(body_id, epoch).await
    }

    async fn health_check(&self) -> EphemerisResult<bool> {
        Ok(true)
    }
}
