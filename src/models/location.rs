//! Location queries and resolved locations

use crate::SentinelError;
use serde::{Deserialize, Serialize};

/// Timezone assigned to locations that were not resolved through geocoding
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// What the user asked to monitor
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    /// Free-text place name, optionally "City, Region"
    ByName(String),
    /// Manual override coordinates, resolved without any network call
    ByCoordinates { latitude: f64, longitude: f64 },
}

impl LocationQuery {
    /// Build a coordinate query, rejecting values outside the valid ranges
    pub fn coordinates(latitude: f64, longitude: f64) -> Result<Self, SentinelError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(SentinelError::validation(format!(
                "Latitude must be between -90 and 90, got: {latitude}"
            )));
        }

        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(SentinelError::validation(format!(
                "Longitude must be between -180 and 180, got: {longitude}"
            )));
        }

        Ok(Self::ByCoordinates {
            latitude,
            longitude,
        })
    }

    /// Split a name query into the place name and its optional region hint.
    ///
    /// Only the first comma separates; an empty hint counts as no hint.
    #[must_use]
    pub fn split_region_hint(text: &str) -> (&str, Option<&str>) {
        match text.split_once(',') {
            Some((name, hint)) => {
                let hint = hint.trim();
                (name.trim(), (!hint.is_empty()).then_some(hint))
            }
            None => (text.trim(), None),
        }
    }
}

/// Coordinates and metadata for the monitored location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Name shown to the user
    pub display_name: String,
    /// IANA timezone id, "UTC" for manual coordinates
    pub timezone_id: String,
}

impl ResolvedLocation {
    /// Location for manually entered coordinates
    #[must_use]
    pub fn manual(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            display_name: format!("Point ({latitude:.4}, {longitude:.4})"),
            timezone_id: DEFAULT_TIMEZONE.to_string(),
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Key under which readings for this location are cached
    #[must_use]
    pub fn cache_key(&self) -> String {
        let (lat, lon) = self.rounded_coordinates(4);
        format!("readings:{lat:.4}:{lon:.4}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_location() {
        let location = ResolvedLocation::manual(37.0759, -94.6394);
        assert_eq!(location.display_name, "Point (37.0759, -94.6394)");
        assert_eq!(location.timezone_id, "UTC");
    }

    #[test]
    fn test_location_cache_key() {
        let location = ResolvedLocation::manual(46.818_234, 8.227_456);
        assert_eq!(location.cache_key(), "readings:46.8182:8.2275");
    }

    #[test]
    fn test_nearby_points_share_cache_key() {
        let a = ResolvedLocation::manual(46.818_21, 8.227_51);
        let b = ResolvedLocation::manual(46.818_24, 8.227_54);
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_split_region_hint() {
        assert_eq!(
            LocationQuery::split_region_hint("Paris, TX"),
            ("Paris", Some("TX"))
        );
        assert_eq!(LocationQuery::split_region_hint("Paris"), ("Paris", None));
        assert_eq!(LocationQuery::split_region_hint("Paris,  "), ("Paris", None));
        assert_eq!(
            LocationQuery::split_region_hint(" Springfield , Illinois, US"),
            ("Springfield", Some("Illinois, US"))
        );
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(LocationQuery::coordinates(46.8, 8.2).is_ok());
        assert!(LocationQuery::coordinates(91.0, 8.0).is_err());
        assert!(LocationQuery::coordinates(-91.0, 8.0).is_err());
        assert!(LocationQuery::coordinates(46.0, 181.0).is_err());
        assert!(LocationQuery::coordinates(f64::NAN, 0.0).is_err());
    }
}
