//! JPL Horizons API client.
//!
//! Observer queries return the geocentric ecliptic longitude (quantity 31);
//! element queries return heliocentric ecliptic osculating elements. Both
//! answers arrive as a JSON envelope whose `result` text holds a CSV table
//! between `$$SOE` and `$$EOE` markers.

use std::str::FromStr;

use super::error::{EphemerisError, EphemerisResult, ErrorContext};
use crate::algorithms::angles::normalize_degrees;
use crate::models::{JulianDate, OrbitalElements, Planet};

pub const DEFAULT_HORIZONS_URL: &str = "https://ssd.jpl.nasa.gov/api/horizons.api";

const START_MARKER: &str = "$$SOE";
const END_MARKER: &str = "$$EOE";

/// Horizons COMMAND for a body id: catalog planets by name or id, anything else verbatim.
pub fn command_id(body_id: &str) -> String {
    match Planet::from_str(body_id) {
        Ok(planet) => planet.horizons_id().to_string(),
        Err(_) => body_id.trim().to_string(),
    }
}

/// Query parameters for a single-epoch geocentric ecliptic longitude.
pub fn observer_query(command: &str, epoch: JulianDate) -> Vec<(&'static str, String)> {
    vec![
        ("format", "json".to_string()),
        ("COMMAND", format!("'{}'", command)),
        ("OBJ_DATA", "NO".to_string()),
        ("MAKE_EPHEM", "YES".to_string()),
        ("EPHEM_TYPE", "OBSERVER".to_string()),
        ("CENTER", "'500@399'".to_string()),
        ("TLIST", format!("'{}'", epoch.value())),
        ("QUANTITIES", "'31'".to_string()),
        ("CSV_FORMAT", "YES".to_string()),
    ]
}

/// Query parameters for heliocentric ecliptic elements at one epoch.
pub fn elements_query(command: &str, epoch: JulianDate) -> Vec<(&'static str, String)> {
    vec![
        ("format", "json".to_string()),
        ("COMMAND", format!("'{}'", command)),
        ("OBJ_DATA", "NO".to_string()),
        ("MAKE_EPHEM", "YES".to_string()),
        ("EPHEM_TYPE", "ELEMENTS".to_string()),
        ("CENTER", "'500@10'".to_string()),
        ("TLIST", format!("'{}'", epoch.value())),
        ("OUT_UNITS", "'AU-D'".to_string()),
        ("REF_PLANE", "'ECLIPTIC'".to_string()),
        ("CSV_FORMAT", "YES".to_string()),
    ]
}

fn malformed(operation: &str, message: impl Into<String>) -> EphemerisError {
    EphemerisError::malformed(message, ErrorContext::new(operation))
}

/// Non-empty lines between the `$$SOE` and `$$EOE` markers.
fn data_block<'a>(text: &'a str, operation: &str) -> EphemerisResult<Vec<&'a str>> {
    let start = text
        .find(START_MARKER)
        .ok_or_else(|| malformed(operation, "no $$SOE marker in response"))?;
    let rest = &text[start + START_MARKER.len()..];
    let end = rest
        .find(END_MARKER)
        .ok_or_else(|| malformed(operation, "no $$EOE marker in response"))?;
    Ok(rest[..end]
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect())
}

/// Longitude from an observer table with quantity 31.
///
/// The last two numeric fields of the first row are ecliptic longitude and
/// latitude, in that order.
pub fn parse_longitude(text: &str) -> EphemerisResult<f64> {
    let operation = "parse_longitude";
    let rows = data_block(text, operation)?;
    let row = rows
        .first()
        .ok_or_else(|| malformed(operation, "empty $$SOE block"))?;
    let numbers: Vec<f64> = row
        .split(',')
        .filter_map(|field| field.trim().parse::<f64>().ok())
        .collect();
    if numbers.len() < 2 {
        return Err(malformed(
            operation,
            format!("no longitude/latitude pair in row: {}", row),
        ));
    }
    Ok(normalize_degrees(numbers[numbers.len() - 2]))
}

/// Value following `label =` where the label starts a token.
fn labeled_value(text: &str, label: &str) -> Option<f64> {
    let mut offset = 0;
    while let Some(pos) = text[offset..].find(label) {
        let at = offset + pos;
        offset = at + label.len();

        let starts_token = text[..at]
            .chars()
            .next_back()
            .map_or(true, char::is_whitespace);
        if !starts_token {
            continue;
        }
        let Some(after_eq) = text[offset..].trim_start().strip_prefix('=') else {
            continue;
        };
        let number: String = after_eq
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
            .collect();
        if let Ok(value) = number.parse::<f64>() {
            return Some(value);
        }
    }
    None
}

/// Column values from the CSV header preceding `$$SOE`.
fn csv_columns(text: &str, names: &[&str]) -> Option<Vec<f64>> {
    let start = text.find(START_MARKER)?;
    let header = text[..start]
        .lines()
        .map(str::trim)
        .filter(|l| l.contains(','))
        .last()?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let rows = data_block(text, "parse_elements").ok()?;
    let row: Vec<&str> = rows.first()?.split(',').map(str::trim).collect();

    names
        .iter()
        .map(|name| {
            let index = columns.iter().position(|c| c.eq_ignore_ascii_case(name))?;
            row.get(index)?.parse::<f64>().ok()
        })
        .collect()
}

/// Heliocentric elements at `epoch`; mean longitude is `OM + W + MA`.
pub fn parse_elements(text: &str, epoch: JulianDate) -> EphemerisResult<OrbitalElements> {
    const LABELS: [&str; 4] = ["OM", "W", "MA", "A"];

    let values = match csv_columns(text, &LABELS) {
        Some(values) => values,
        None => LABELS
            .iter()
            .map(|label| labeled_value(text, label))
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| {
                malformed(
                    "parse_elements",
                    "could not locate OM, W, MA and A in elements response",
                )
            })?,
    };
    let (node, perihelion, anomaly, axis) = (values[0], values[1], values[2], values[3]);

    if !(axis.is_finite() && axis > 0.0) {
        return Err(malformed(
            "parse_elements",
            format!("semi-major axis must be positive, got {}", axis),
        ));
    }

    Ok(OrbitalElements {
        semi_major_axis_au: axis,
        reference_mean_longitude_deg: normalize_degrees(node + perihelion + anomaly),
        reference_epoch: epoch,
    })
}

#[cfg(feature = "horizons-client")]
pub use self::client::HorizonsClient;

#[cfg(feature = "horizons-client")]
mod client {
    use std::time::Duration;

    use async_trait::async_trait;
    use log::debug;
    use serde::Deserialize;

    use super::*;
    use crate::ephemeris::client::EphemerisClient;

    #[derive(Debug, Deserialize)]
    struct HorizonsEnvelope {
        result: Option<String>,
        error: Option<String>,
    }

    /// Horizons client sharing one connection pool across all requests.
    #[derive(Debug, Clone)]
    pub struct HorizonsClient {
        http: reqwest::Client,
        base_url: String,
    }

    impl HorizonsClient {
        pub fn new(base_url: impl Into<String>, timeout: Duration) -> EphemerisResult<Self> {
            let http = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| {
                    EphemerisError::configuration(format!("Failed to build HTTP client: {}", e))
                })?;
            Ok(Self {
                http,
                base_url: base_url.into(),
            })
        }

        pub fn base_url(&self) -> &str {
            &self.base_url
        }

        async fn fetch(
            &self,
            params: &[(&'static str, String)],
            context: ErrorContext,
        ) -> EphemerisResult<String> {
            debug!("horizons request {}", context);
            let response = self
                .http
                .get(&self.base_url)
                .query(params)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        EphemerisError::timeout(e.to_string(), context.clone())
                    } else {
                        EphemerisError::transport(e.to_string(), context.clone())
                    }
                })?;

            let status = response.status();
            if status.is_server_error() {
                return Err(EphemerisError::transport(
                    format!("HTTP {}", status),
                    context.with_details(format!("status={}", status.as_u16())),
                ));
            }
            if !status.is_success() {
                return Err(EphemerisError::transport_fatal(
                    format!("HTTP {}", status),
                    context.with_details(format!("status={}", status.as_u16())),
                ));
            }

            let envelope: HorizonsEnvelope = response
                .json()
                .await
                .map_err(|e| EphemerisError::malformed(e.to_string(), context.clone()))?;
            if let Some(error) = envelope.error {
                return Err(EphemerisError::unsupported(error, context));
            }
            envelope.result.ok_or_else(|| {
                EphemerisError::malformed("response has no result field", context)
            })
        }
    }

    /// Attach request identity to a parse failure.
    fn with_request(err: EphemerisError, context: &ErrorContext) -> EphemerisError {
        match err {
            EphemerisError::Malformed { message, .. } => {
                EphemerisError::malformed(message, context.clone())
            }
            other => other,
        }
    }

    #[async_trait]
    impl EphemerisClient for HorizonsClient {
        async fn get_longitude(&self, body_id: &str, epoch: JulianDate) -> EphemerisResult<f64> {
            let context = ErrorContext::new("get_longitude")
                .with_body(body_id)
                .with_epoch(epoch.value());
            let params = observer_query(&command_id(body_id), epoch);
            let text = self.fetch(&params, context.clone()).await?;
            parse_longitude(&text).map_err(|e| with_request(e, &context))
        }

        async fn get_elements(
            &self,
            body_id: &str,
            epoch: JulianDate,
        ) -> EphemerisResult<OrbitalElements> {
            let context = ErrorContext::new("get_elements")
                .with_body(body_id)
                .with_epoch(epoch.value());
            let params = elements_query(&command_id(body_id), epoch);
            let text = self.fetch(&params, context.clone()).await?;
            parse_elements(&text, epoch).map_err(|e| with_request(e, &context))
        }

        async fn health_check(&self) -> EphemerisResult<bool> {
            let response = self
                .http
                .get(&self.base_url)
                .query(&[("format", "json"), ("COMMAND", "'399'"), ("MAKE_EPHEM", "NO")])
                .send()
                .await
                .map_err(|e| {
                    EphemerisError::transport(e.to_string(), ErrorContext::new("health_check"))
                })?;
            Ok(response.status().is_success())
        }
    }
}
