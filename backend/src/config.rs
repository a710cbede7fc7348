//! Scan configuration from TOML files and environment variables.
//!
//! Every section and field has a default, so an empty file (or no file) gives a
//! complete configuration: the seven non-Earth planets from 2026-01-01 to
//! 2028-12-31 with a 10° threshold, analytic strategy, queried from Horizons.
//!
//! Environment variables override file values:
//! - `ALIGN_START`, `ALIGN_END`: ISO dates
//! - `ALIGN_PLANETS`: comma-separated planet names
//! - `ALIGN_THRESHOLD`: degrees
//! - `ALIGN_STRATEGY`: `exhaustive` | `analytic`
//! - `EPHEMERIS_TYPE`: `horizons` | `local`
//! - `HORIZONS_URL`
//! - `EPHEMERIS_TIMEOUT_SEC`, `EPHEMERIS_MAX_RETRIES`, `EPHEMERIS_CONCURRENCY`

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::algorithms::candidates::{CandidateSettings, DEFAULT_MARGIN_FACTOR};
use crate::algorithms::orbital::Projection;
use crate::ephemeris::{EphemerisType, RetryPolicy, DEFAULT_HORIZONS_URL};
use crate::error::{AlignmentError, AlignmentResult};
use crate::models::{Planet, ScanWindow};
use crate::services::ScanStrategy;

pub const CONFIG_FILE_NAME: &str = "alignment.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub candidates: CandidateConfig,
    #[serde(default)]
    pub ephemeris: EphemerisSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// `[scan]`: what to look for and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    /// Inclusive.
    #[serde(default = "default_end_date")]
    pub end_date: NaiveDate,
    #[serde(default = "default_planets")]
    pub planets: Vec<String>,
    #[serde(default = "default_threshold_deg")]
    pub threshold_deg: f64,
    #[serde(default)]
    pub strategy: ScanStrategy,
}

/// `[candidates]`: tuning of the analytic pre-filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateConfig {
    #[serde(default = "default_margin_factor")]
    pub margin_factor: f64,
    #[serde(default)]
    pub projection: Projection,
    #[serde(default = "default_observer")]
    pub observer: String,
    /// Per-planet overrides of the catalog model-error tolerance, degrees.
    #[serde(default)]
    pub tolerances: BTreeMap<String, f64>,
}

/// `[ephemeris]`: collaborator selection and request policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemerisSettings {
    #[serde(rename = "type", default)]
    pub client_type: EphemerisType,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Dates verified concurrently.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Epoch of the reference elements; defaults to the middle of the scan window.
    #[serde(default)]
    pub elements_epoch: Option<NaiveDate>,
    /// JSON fixture for the local client.
    #[serde(default)]
    pub fixture_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// What the binary runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// One scan with the configured strategy
    #[default]
    Scan,
    /// Both strategies side by side
    Compare,
    /// Daily spread series
    Spans,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub mode: OutputMode,
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default()
}

fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2028, 12, 31).unwrap_or_default()
}

fn default_planets() -> Vec<String> {
    Planet::ALIGNABLE
        .iter()
        .map(|p| p.name().to_string())
        .collect()
}

fn default_threshold_deg() -> f64 {
    10.0
}

fn default_margin_factor() -> f64 {
    DEFAULT_MARGIN_FACTOR
}

fn default_observer() -> String {
    Planet::Earth.name().to_string()
}

fn default_base_url() -> String {
    DEFAULT_HORIZONS_URL.to_string()
}

fn default_timeout_sec() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    250
}

fn default_max_concurrency() -> usize {
    4
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            end_date: default_end_date(),
            planets: default_planets(),
            threshold_deg: default_threshold_deg(),
            strategy: ScanStrategy::default(),
        }
    }
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            margin_factor: default_margin_factor(),
            projection: Projection::default(),
            observer: default_observer(),
            tolerances: BTreeMap::new(),
        }
    }
}

impl Default for EphemerisSettings {
    fn default() -> Self {
        Self {
            client_type: EphemerisType::default(),
            base_url: default_base_url(),
            timeout_sec: default_timeout_sec(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_concurrency: default_max_concurrency(),
            elements_epoch: None,
            fixture_path: None,
        }
    }
}

impl EphemerisSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            timeout: Duration::from_secs(self.timeout_sec),
        }
    }
}

/// Parse an environment override, or leave the current value untouched.
fn env_override<T: FromStr>(name: &str) -> AlignmentResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map(Some).map_err(|e| {
            AlignmentError::configuration(format!("Invalid {}={:?}: {}", name, raw, e))
        }),
        _ => Ok(None),
    }
}

impl AlignmentConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(AlignmentConfig)` if successful
    /// * `Err(AlignmentError::Configuration)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> AlignmentResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            AlignmentError::configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AlignmentResult<Self> {
        toml::from_str(content).map_err(|e| {
            AlignmentError::configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `alignment.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    ///
    /// # Returns
    /// * `Ok(None)` if no candidate file exists
    /// * `Err(AlignmentError::Configuration)` if the first file found cannot be read or parsed
    pub fn from_default_location() -> AlignmentResult<Option<Self>> {
        let search_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from("backend").join(CONFIG_FILE_NAME),
            PathBuf::from("..").join(CONFIG_FILE_NAME),
        ];

        match search_paths.iter().find(|path| path.exists()) {
            Some(path) => Self::from_file(path).map(Some),
            None => Ok(None),
        }
    }

    /// Full load used by the binary: explicit file, else default location, else
    /// defaults; then environment overrides; then validation.
    pub fn load(path: Option<&Path>) -> AlignmentResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_default_location()?.unwrap_or_default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> AlignmentResult<()> {
        if let Some(start) = env_override::<NaiveDate>("ALIGN_START")? {
            self.scan.start_date = start;
        }
        if let Some(end) = env_override::<NaiveDate>("ALIGN_END")? {
            self.scan.end_date = end;
        }
        if let Some(planets) = env_override::<String>("ALIGN_PLANETS")? {
            self.scan.planets = planets
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(threshold) = env_override::<f64>("ALIGN_THRESHOLD")? {
            self.scan.threshold_deg = threshold;
        }
        if let Some(strategy) = env_override::<ScanStrategy>("ALIGN_STRATEGY")? {
            self.scan.strategy = strategy;
        }
        if let Some(client_type) = env_override::<EphemerisType>("EPHEMERIS_TYPE")? {
            self.ephemeris.client_type = client_type;
        }
        if let Some(url) = env_override::<String>("HORIZONS_URL")? {
            self.ephemeris.base_url = url;
        }
        if let Some(timeout) = env_override::<u64>("EPHEMERIS_TIMEOUT_SEC")? {
            self.ephemeris.timeout_sec = timeout;
        }
        if let Some(retries) = env_override::<u32>("EPHEMERIS_MAX_RETRIES")? {
            self.ephemeris.max_retries = retries;
        }
        if let Some(concurrency) = env_override::<usize>("EPHEMERIS_CONCURRENCY")? {
            self.ephemeris.max_concurrency = concurrency;
        }
        Ok(())
    }

    /// Reject configurations a scan cannot run with.
    pub fn validate(&self) -> AlignmentResult<()> {
        let threshold = self.scan.threshold_deg;
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(AlignmentError::domain(format!(
                "threshold_deg must be positive, got {}",
                threshold
            )));
        }
        if self.scan.start_date > self.scan.end_date {
            return Err(AlignmentError::domain(format!(
                "start_date {} is after end_date {}",
                self.scan.start_date, self.scan.end_date
            )));
        }

        let planets = self.planets()?;
        if planets.len() < 2 {
            return Err(AlignmentError::domain(format!(
                "at least 2 planets are required, got {}",
                planets.len()
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = planets.iter().find(|p| !seen.insert(**p)) {
            return Err(AlignmentError::domain(format!("planet {} listed twice", dup)));
        }

        let observer = self.observer()?;
        if planets.contains(&observer) {
            return Err(AlignmentError::domain(format!(
                "observer {} cannot be one of the scanned planets",
                observer
            )));
        }

        let margin = self.candidates.margin_factor;
        if !(margin.is_finite() && margin >= 1.0) {
            return Err(AlignmentError::domain(format!(
                "margin_factor must be >= 1, got {}",
                margin
            )));
        }
        for (name, tolerance) in &self.candidates.tolerances {
            Planet::from_str(name)?;
            if !(tolerance.is_finite() && *tolerance >= 0.0) {
                return Err(AlignmentError::domain(format!(
                    "tolerance for {} must be non-negative, got {}",
                    name, tolerance
                )));
            }
        }

        if self.ephemeris.max_concurrency == 0 {
            return Err(AlignmentError::domain("max_concurrency must be at least 1"));
        }
        Ok(())
    }

    /// Scanned planets, in configuration order.
    pub fn planets(&self) -> AlignmentResult<Vec<Planet>> {
        self.scan
            .planets
            .iter()
            .map(|name| Planet::from_str(name))
            .collect()
    }

    pub fn observer(&self) -> AlignmentResult<Planet> {
        Planet::from_str(&self.candidates.observer)
    }

    pub fn window(&self) -> ScanWindow {
        ScanWindow::new(self.scan.start_date, self.scan.end_date)
    }

    /// Configured elements epoch, or the middle of the scan window.
    pub fn elements_epoch(&self) -> NaiveDate {
        self.ephemeris.elements_epoch.unwrap_or_else(|| {
            let half = (self.scan.end_date - self.scan.start_date).num_days() / 2;
            self.scan.start_date + chrono::Duration::days(half)
        })
    }

    /// Model-error tolerance for `planet`: configured override, else catalog default.
    pub fn tolerance_for(&self, planet: Planet) -> f64 {
        self.candidates
            .tolerances
            .iter()
            .find(|(name, _)| Planet::from_str(name).ok() == Some(planet))
            .map(|(_, tolerance)| *tolerance)
            .unwrap_or_else(|| planet.default_tolerance_deg())
    }

    pub fn candidate_settings(&self) -> CandidateSettings {
        CandidateSettings::new(self.scan.threshold_deg)
            .with_margin_factor(self.candidates.margin_factor)
            .with_projection(self.candidates.projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = AlignmentConfig::from_toml("").unwrap();
        assert_eq!(config, AlignmentConfig::default());
        assert_eq!(config.scan.planets.len(), 7);
        assert_eq!(config.scan.threshold_deg, 10.0);
        assert_eq!(config.scan.strategy, ScanStrategy::Analytic);
        assert_eq!(config.candidates.projection, Projection::Geocentric);
        assert_eq!(config.ephemeris.client_type, EphemerisType::Horizons);
        assert_eq!(config.ephemeris.max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[scan]
start_date = "2030-01-01"
end_date = "2030-06-30"
planets = ["Mars", "jupiter", "599"]
threshold_deg = 15.0
strategy = "exhaustive"

[candidates]
margin_factor = 2.0
projection = "heliocentric"
tolerances = { Mars = 30.0 }

[ephemeris]
type = "local"
timeout_sec = 5
max_concurrency = 8
elements_epoch = "2030-03-01"

[output]
format = "json"
mode = "compare"
"#;
        let config = AlignmentConfig::from_toml(toml).unwrap();
        assert_eq!(config.scan.strategy, ScanStrategy::Exhaustive);
        assert_eq!(config.candidates.projection, Projection::Heliocentric);
        assert_eq!(config.ephemeris.client_type, EphemerisType::Local);
        assert_eq!(config.ephemeris.retry_delay_ms, 250);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.mode, OutputMode::Compare);
        assert_eq!(config.tolerance_for(Planet::Mars), 30.0);
        assert_eq!(config.tolerance_for(Planet::Jupiter), 8.0);
        assert_eq!(
            config.elements_epoch(),
            NaiveDate::from_ymd_opt(2030, 3, 1).unwrap()
        );
        // "jupiter" and "599" name the same planet.
        assert!(matches!(config.validate(), Err(AlignmentError::Domain(_))));
    }

    #[test]
    fn test_unknown_field_type_is_configuration_error() {
        let err = AlignmentConfig::from_toml("[scan]\nthreshold_deg = \"ten\"").unwrap_err();
        assert!(matches!(err, AlignmentError::Configuration(_)));
    }

    #[test]
    fn test_validate_rejects_bad_inputs() {
        let mut config = AlignmentConfig::default();
        config.scan.threshold_deg = 0.0;
        assert!(matches!(config.validate(), Err(AlignmentError::Domain(_))));

        let mut config = AlignmentConfig::default();
        config.scan.start_date = NaiveDate::from_ymd_opt(2029, 1, 1).unwrap();
        assert!(matches!(config.validate(), Err(AlignmentError::Domain(_))));

        let mut config = AlignmentConfig::default();
        config.scan.planets = vec!["Mars".into()];
        assert!(matches!(config.validate(), Err(AlignmentError::Domain(_))));

        let mut config = AlignmentConfig::default();
        config.scan.planets = vec!["Mars".into(), "Vulcan".into()];
        assert!(matches!(config.validate(), Err(AlignmentError::Domain(_))));

        let mut config = AlignmentConfig::default();
        config.scan.planets = vec!["Mars".into(), "Earth".into()];
        assert!(matches!(config.validate(), Err(AlignmentError::Domain(_))));

        let mut config = AlignmentConfig::default();
        config.candidates.margin_factor = 0.5;
        assert!(matches!(config.validate(), Err(AlignmentError::Domain(_))));

        let mut config = AlignmentConfig::default();
        config.ephemeris.max_concurrency = 0;
        assert!(matches!(config.validate(), Err(AlignmentError::Domain(_))));
    }

    #[test]
    fn test_elements_epoch_defaults_to_window_middle() {
        let config = AlignmentConfig::default();
        // 2026-01-01 .. 2028-12-31 spans 1095 days; half is 547.
        assert_eq!(
            config.elements_epoch(),
            NaiveDate::from_ymd_opt(2027, 7, 2).unwrap()
        );
    }

    #[test]
    fn test_candidate_settings_follow_config() {
        let mut config = AlignmentConfig::default();
        config.scan.threshold_deg = 5.0;
        config.candidates.margin_factor = 2.0;
        let settings = config.candidate_settings();
        assert_eq!(settings.threshold_deg, 5.0);
        assert_eq!(settings.margin_factor, 2.0);
        assert_eq!(settings.projection, Projection::Geocentric);
    }
}
