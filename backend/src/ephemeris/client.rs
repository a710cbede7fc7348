//! Contract between the scan core and an ephemeris service.

use async_trait::async_trait;

use super::error::EphemerisResult;
use crate::models::{JulianDate, OrbitalElements};

/// Source of true body positions.
///
/// The core only ever asks two questions: where is a body at an instant, and
/// what are its reference elements. Connection handling, caching and retries
/// live behind this trait.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so verification can fan out across
/// concurrent tasks.
#[async_trait]
pub trait EphemerisClient: Send + Sync {
    /// Geocentric ecliptic longitude of a body.
    ///
    /// # Arguments
    /// * `body_id` - Planet name or Horizons command id
    /// * `epoch` - Instant of the observation
    ///
    /// # Returns
    /// * `Ok(f64)` - Longitude in degrees, normalized to [0, 360)
    /// * `Err(EphemerisError)` - If the service cannot answer
    async fn get_longitude(&self, body_id: &str, epoch: JulianDate) -> EphemerisResult<f64>;

    /// Heliocentric ecliptic elements used to seed the orbital model.
    ///
    /// # Arguments
    /// * `body_id` - Service-specific body identifier
    /// * `epoch` - Epoch at which the elements are osculating
    async fn get_elements(
        &self,
        body_id: &str,
        epoch: JulianDate,
    ) -> EphemerisResult<OrbitalElements>;

    /// Longitudes for several bodies at one epoch, in the order given.
    ///
    /// Services that support batched queries override this; the default issues
    /// one request per body and stops at the first failure.
    async fn get_longitudes(
        &self,
        body_ids: &[String],
        epoch: JulianDate,
    ) -> EphemerisResult<Vec<f64>> {
        let mut longitudes = Vec::with_capacity(body_ids.len());
        for id in body_ids {
            longitudes.push(self.get_longitude(id, epoch).await?);
        }
        Ok(longitudes)
    }

    /// Check that the service is reachable.
    async fn health_check(&self) -> EphemerisResult<bool>;
}
