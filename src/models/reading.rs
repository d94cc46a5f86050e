//! Atmosphere and entropy readings

use serde::{Deserialize, Serialize};

/// Standard sea-level pressure in hPa, used when the forecast source is down
pub const FALLBACK_PRESSURE_HPA: f64 = 1013.25;

/// Wind speed used when the forecast source is down
pub const FALLBACK_WIND_SPEED: f64 = 0.0;

/// Entropy scalar used when the random byte source is down
pub const FALLBACK_VARIANCE_SCALAR: f64 = 0.4288;

/// Where a reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingSource {
    /// Fetched from the upstream service
    Live,
    /// Substituted fallback constant
    Fallback,
}

/// Current surface conditions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtmosphereReading {
    /// Surface pressure in hPa
    pub pressure_hpa: f64,
    /// Wind speed in km/h
    pub wind_speed: f64,
    pub source: ReadingSource,
}

impl AtmosphereReading {
    #[must_use]
    pub fn live(pressure_hpa: f64, wind_speed: f64) -> Self {
        Self {
            pressure_hpa,
            wind_speed,
            source: ReadingSource::Live,
        }
    }

    #[must_use]
    pub fn fallback() -> Self {
        Self {
            pressure_hpa: FALLBACK_PRESSURE_HPA,
            wind_speed: FALLBACK_WIND_SPEED,
            source: ReadingSource::Fallback,
        }
    }

    /// Format atmospheric pressure with unit
    #[must_use]
    pub fn format_pressure(&self) -> String {
        format!("{:.1} hPa", self.pressure_hpa)
    }

    /// Format wind speed with unit
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.1} km/h", self.wind_speed)
    }
}

/// Normalised variance of a batch of external random bytes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntropySample {
    pub variance_scalar: f64,
    pub source: ReadingSource,
}

impl EntropySample {
    #[must_use]
    pub fn live(variance_scalar: f64) -> Self {
        Self {
            variance_scalar,
            source: ReadingSource::Live,
        }
    }

    #[must_use]
    pub fn fallback() -> Self {
        Self {
            variance_scalar: FALLBACK_VARIANCE_SCALAR,
            source: ReadingSource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_constants() {
        let atmosphere = AtmosphereReading::fallback();
        assert_eq!(atmosphere.pressure_hpa, 1013.25);
        assert_eq!(atmosphere.wind_speed, 0.0);
        assert_eq!(atmosphere.source, ReadingSource::Fallback);

        let entropy = EntropySample::fallback();
        assert_eq!(entropy.variance_scalar, 0.4288);
        assert_eq!(entropy.source, ReadingSource::Fallback);
    }

    #[test]
    fn test_formatting() {
        let reading = AtmosphereReading::live(990.04, 12.26);
        assert_eq!(reading.format_pressure(), "990.0 hPa");
        assert_eq!(reading.format_wind(), "12.3 km/h");
    }

    #[test]
    fn test_source_serializes_lowercase() {
        let json = serde_json::to_string(&EntropySample::live(0.5)).unwrap();
        assert_eq!(json, r#"{"variance_scalar":0.5,"source":"live"}"#);
    }
}
