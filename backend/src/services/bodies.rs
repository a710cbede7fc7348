//! Startup loading of body elements from the ephemeris collaborator.

use chrono::NaiveDate;
use log::{debug, info};

use crate::algorithms::orbital::body_mean_motion;
use crate::config::AlignmentConfig;
use crate::ephemeris::EphemerisClient;
use crate::error::{AlignmentError, AlignmentResult};
use crate::models::{Body, JulianDate, Planet};

/// Fetch reference elements once per planet and build validated bodies.
///
/// Each body gets the tolerance returned by `tolerance_for`. A collaborator
/// failure here is fatal: the scan cannot start without its model. So is a
/// body whose elements give no positive mean motion.
pub async fn load_bodies<F>(
    client: &dyn EphemerisClient,
    planets: &[Planet],
    epoch: NaiveDate,
    tolerance_for: F,
) -> AlignmentResult<Vec<Body>>
where
    F: Fn(Planet) -> f64,
{
    let jd = JulianDate::from_date(epoch);
    let mut bodies = Vec::with_capacity(planets.len());

    for planet in planets {
        let elements = client.get_elements(planet.name(), jd).await?;
        let body = Body::from_elements(planet.name(), &elements).with_tolerance(tolerance_for(*planet));
        let n = body_mean_motion(&body)?;
        debug!(
            "{}: a={:.6} AU, L0={:.4}°, n={:.6}°/day, tolerance={}°",
            body.id,
            elements.semi_major_axis_au,
            elements.reference_mean_longitude_deg,
            n.deg_per_day(),
            body.tolerance_deg
        );
        bodies.push(body);
    }

    info!("loaded elements for {} bodies at {}", bodies.len(), epoch);
    Ok(bodies)
}

/// Scanned bodies and observer as described by `config`.
pub async fn load_configured_bodies(
    client: &dyn EphemerisClient,
    config: &AlignmentConfig,
) -> AlignmentResult<(Vec<Body>, Body)> {
    let planets = config.planets()?;
    let observer = config.observer()?;
    let epoch = config.elements_epoch();

    let bodies = load_bodies(client, &planets, epoch, |p| config.tolerance_for(p)).await?;
    let mut observers = load_bodies(client, &[observer], epoch, |_| 0.0).await?;
    let observer = observers
        .pop()
        .ok_or_else(|| AlignmentError::model("observer elements could not be loaded"))?;
    Ok((bodies, observer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::{EphemerisError, LocalEphemeris};
    use crate::models::OrbitalElements;

    fn epoch() -> NaiveDate {
        NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()
    }

    #[tokio::test]
    async fn test_load_synthetic_bodies() {
        let client = LocalEphemeris::synthetic();
        let planets = [Planet::Mars, Planet::Jupiter];
        let bodies = load_bodies(&client, &planets, epoch(), |p| p.default_tolerance_deg())
            .await
            .unwrap();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0].id, "Mars");
        assert_eq!(bodies[0].tolerance_deg, 50.0);
        assert_eq!(bodies[1].reference_epoch, JulianDate::from_date(epoch()));
    }

    #[tokio::test]
    async fn test_missing_elements_is_fatal() {
        let client = LocalEphemeris::new();
        let err = load_bodies(&client, &[Planet::Mars], epoch(), |_| 0.0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AlignmentError::Ephemeris(EphemerisError::Unsupported { .. })
        ));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn test_bad_elements_are_model_inconsistency() {
        let client = LocalEphemeris::new();
        client.insert_elements(
            "Mars",
            OrbitalElements {
                semi_major_axis_au: -1.0,
                reference_mean_longitude_deg: 0.0,
                reference_epoch: JulianDate::from_date(epoch()),
            },
        );
        let err = load_bodies(&client, &[Planet::Mars], epoch(), |_| 0.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AlignmentError::ModelInconsistency(_)));
    }

    #[tokio::test]
    async fn test_load_configured_bodies_applies_overrides() {
        let mut config = AlignmentConfig::default();
        config.scan.planets = vec!["Venus".into(), "Saturn".into()];
        config.candidates.tolerances.insert("saturn".into(), 3.0);

        let client = LocalEphemeris::synthetic();
        let (bodies, observer) = load_configured_bodies(&client, &config).await.unwrap();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0].tolerance_deg, 12.0);
        assert_eq!(bodies[1].tolerance_deg, 3.0);
        assert_eq!(observer.id, "Earth");
    }
}
