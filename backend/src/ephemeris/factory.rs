//! Ephemeris client factory.
//!
//! Builds the configured client and wraps it in the retry layer so the scan
//! core only ever sees a single `Arc<dyn EphemerisClient>`.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::client::EphemerisClient;
use super::error::EphemerisResult;
use super::local::LocalEphemeris;
use super::retry::RetryingClient;
use crate::config::EphemerisSettings;

/// Ephemeris backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EphemerisType {
    /// JPL Horizons HTTP API
    #[default]
    Horizons,
    /// In-memory client (fixture file or nominal circular orbits)
    Local,
}

impl FromStr for EphemerisType {
    type Err = String;

    /// Parse ephemeris type from string ("horizons", "jpl", "local").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "horizons" | "jpl" => Ok(Self::Horizons),
            "local" => Ok(Self::Local),
            _ => Err(format!("Unknown ephemeris type: {}", s)),
        }
    }
}

pub struct EphemerisFactory;

impl EphemerisFactory {
    /// Create the client described by `settings`, wrapped in [`RetryingClient`].
    ///
    /// # Returns
    /// * `Ok(Arc<dyn EphemerisClient>)` - Ready-to-use client
    /// * `Err(EphemerisError)` - If the client cannot be configured
    pub fn create(settings: &EphemerisSettings) -> EphemerisResult<Arc<dyn EphemerisClient>> {
        let policy = settings.retry_policy();
        match settings.client_type {
            EphemerisType::Horizons => {
                #[cfg(feature = "horizons-client")]
                {
                    let client =
                        super::horizons::HorizonsClient::new(&settings.base_url, policy.timeout)?;
                    Ok(Arc::new(RetryingClient::new(client, policy)))
                }
                #[cfg(not(feature = "horizons-client"))]
                {
                    let _ = policy;
                    Err(super::error::EphemerisError::configuration(
                        "Horizons client feature not enabled",
                    ))
                }
            }
            EphemerisType::Local => {
                let local = Self::create_local(settings)?;
                Ok(Arc::new(RetryingClient::new(local, policy)))
            }
        }
    }

    /// Local client from the configured fixture, or the synthetic catalog model.
    pub fn create_local(settings: &EphemerisSettings) -> EphemerisResult<LocalEphemeris> {
        match &settings.fixture_path {
            Some(path) => LocalEphemeris::from_fixture(path),
            None => Ok(LocalEphemeris::synthetic()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::EphemerisError;
    use crate::models::JulianDate;

    #[test]
    fn test_parse_ephemeris_type() {
        assert_eq!("horizons".parse::<EphemerisType>(), Ok(EphemerisType::Horizons));
        assert_eq!("JPL".parse::<EphemerisType>(), Ok(EphemerisType::Horizons));
        assert_eq!(" Local ".parse::<EphemerisType>(), Ok(EphemerisType::Local));
        assert!("postgres".parse::<EphemerisType>().is_err());
    }

    #[tokio::test]
    async fn test_create_local_without_fixture_is_synthetic() {
        let settings = EphemerisSettings {
            client_type: EphemerisType::Local,
            ..EphemerisSettings::default()
        };
        let client = EphemerisFactory::create(&settings).unwrap();
        let lon = client
            .get_longitude("Saturn", JulianDate::new(2_461_041.5))
            .await
            .unwrap();
        assert!((0.0..360.0).contains(&lon));
        assert!(client.health_check().await.unwrap());
    }

    #[test]
    fn test_create_local_with_missing_fixture_fails() {
        let settings = EphemerisSettings {
            client_type: EphemerisType::Local,
            fixture_path: Some("/nonexistent/ephemeris.json".into()),
            ..EphemerisSettings::default()
        };
        assert!(matches!(
            EphemerisFactory::create(&settings),
            Err(EphemerisError::Configuration { .. })
        ));
    }
}
