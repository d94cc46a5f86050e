//! Location Resolution Module
//!
//! Resolves a [`LocationQuery`] into a [`ResolvedLocation`]. Name queries go
//! through the `OpenMeteo` geocoding search; manual coordinates are resolved
//! locally.

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::SentinelError;
use crate::config::SentinelConfig;
use crate::models::location::DEFAULT_TIMEZONE;
use crate::models::{LocationQuery, ResolvedLocation};

pub use openmeteo::GeocodingCandidate;

/// Service for resolving location queries
pub struct GeocodeResolver {
    client: Client,
    base_url: String,
    candidate_count: u32,
}

impl GeocodeResolver {
    #[must_use]
    pub fn new(client: Client, config: &SentinelConfig) -> Self {
        Self {
            client,
            base_url: config.endpoints.geocoding_url.clone(),
            candidate_count: config.geocoding.candidate_count,
        }
    }

    /// Resolve a location query into a structured location.
    ///
    /// Any failure of the geocoding service is reported as
    /// [`SentinelError::LocationNotFound`].
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        query: &LocationQuery,
    ) -> std::result::Result<ResolvedLocation, SentinelError> {
        let location = match query {
            LocationQuery::ByCoordinates {
                latitude,
                longitude,
            } => {
                debug!("Using manual coordinates: ({}, {})", latitude, longitude);
                ResolvedLocation::manual(*latitude, *longitude)
            }
            LocationQuery::ByName(text) => self.resolve_name(text).await?,
        };

        info!(
            "Resolved location: {} at ({:.4}, {:.4})",
            location.display_name, location.latitude, location.longitude
        );

        Ok(location)
    }

    async fn resolve_name(
        &self,
        text: &str,
    ) -> std::result::Result<ResolvedLocation, SentinelError> {
        let (name, hint) = LocationQuery::split_region_hint(text);
        if name.is_empty() {
            return Err(SentinelError::location_not_found(text));
        }

        let candidates = match self.search(name).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Geocoding lookup for '{}' failed: {:#}", name, e);
                return Err(SentinelError::location_not_found(text));
            }
        };

        select_candidate(&candidates, hint)
            .map(ResolvedLocation::from)
            .ok_or_else(|| {
                warn!("No results found for location '{}'", text);
                SentinelError::location_not_found(text)
            })
    }

    async fn search(&self, name: &str) -> Result<Vec<GeocodingCandidate>> {
        let url = format!(
            "{}?name={}&count={}&language=en&format=json",
            self.base_url,
            urlencoding::encode(name),
            self.candidate_count
        );
        debug!("Geocoding request URL: {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body: openmeteo::GeocodingResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse OpenMeteo geocoding response")?;

        let candidates = body.results.unwrap_or_default();
        debug!(
            "Geocoding results: {:?}",
            candidates
                .iter()
                .map(|c| format!("{} ({:.4}, {:.4})", c.name, c.latitude, c.longitude))
                .collect::<Vec<_>>()
        );

        Ok(candidates)
    }
}

/// Pick the candidate to monitor.
///
/// With a region hint, the first candidate whose `admin1` or `country_code`
/// contains the hint (case-insensitively) wins; otherwise the first candidate.
/// Two-letter US state codes also match the state's full name, so "TX"
/// selects an `admin1` of "Texas".
#[must_use]
pub fn select_candidate<'a>(
    candidates: &'a [GeocodingCandidate],
    hint: Option<&str>,
) -> Option<&'a GeocodingCandidate> {
    if let Some(hint) = hint {
        let hint_lower = hint.to_lowercase();
        let state_name = us_state_name(hint).map(str::to_lowercase);

        let matching = candidates.iter().find(|candidate| {
            let field_matches = [&candidate.admin1, &candidate.country_code]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&hint_lower));
            let state_matches = match (&state_name, &candidate.admin1) {
                (Some(state), Some(admin1)) => admin1.to_lowercase() == *state,
                _ => false,
            };
            field_matches || state_matches
        });
        if matching.is_some() {
            return matching;
        }
    }

    candidates.first()
}

/// Full name for a two-letter US state or territory code
fn us_state_name(code: &str) -> Option<&'static str> {
    let name = match code.trim().to_uppercase().as_str() {
        "AL" => "Alabama",
        "AK" => "Alaska",
        "AZ" => "Arizona",
        "AR" => "Arkansas",
        "CA" => "California",
        "CO" => "Colorado",
        "CT" => "Connecticut",
        "DE" => "Delaware",
        "DC" => "District of Columbia",
        "FL" => "Florida",
        "GA" => "Georgia",
        "HI" => "Hawaii",
        "ID" => "Idaho",
        "IL" => "Illinois",
        "IN" => "Indiana",
        "IA" => "Iowa",
        "KS" => "Kansas",
        "KY" => "Kentucky",
        "LA" => "Louisiana",
        "ME" => "Maine",
        "MD" => "Maryland",
        "MA" => "Massachusetts",
        "MI" => "Michigan",
        "MN" => "Minnesota",
        "MS" => "Mississippi",
        "MO" => "Missouri",
        "MT" => "Montana",
        "NE" => "Nebraska",
        "NV" => "Nevada",
        "NH" => "New Hampshire",
        "NJ" => "New Jersey",
        "NM" => "New Mexico",
        "NY" => "New York",
        "NC" => "North Carolina",
        "ND" => "North Dakota",
        "OH" => "Ohio",
        "OK" => "Oklahoma",
        "OR" => "Oregon",
        "PA" => "Pennsylvania",
        "PR" => "Puerto Rico",
        "RI" => "Rhode Island",
        "SC" => "South Carolina",
        "SD" => "South Dakota",
        "TN" => "Tennessee",
        "TX" => "Texas",
        "UT" => "Utah",
        "VT" => "Vermont",
        "VA" => "Virginia",
        "WA" => "Washington",
        "WV" => "West Virginia",
        "WI" => "Wisconsin",
        "WY" => "Wyoming",
        _ => return None,
    };
    Some(name)
}

impl From<&GeocodingCandidate> for ResolvedLocation {
    fn from(candidate: &GeocodingCandidate) -> Self {
        let display_name = match &candidate.admin1 {
            Some(admin1) => format!("{}, {}", candidate.name, admin1),
            None => candidate.name.clone(),
        };

        ResolvedLocation {
            latitude: candidate.latitude,
            longitude: candidate.longitude,
            display_name,
            timezone_id: candidate
                .timezone
                .clone()
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        }
    }
}

/// `OpenMeteo` geocoding response structures
mod openmeteo {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResponse {
        pub results: Option<Vec<GeocodingCandidate>>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct GeocodingCandidate {
        pub name: String,
        pub latitude: f64,
        pub longitude: f64,
        pub admin1: Option<String>,
        pub country_code: Option<String>,
        pub timezone: Option<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, admin1: Option<&str>, country_code: &str) -> GeocodingCandidate {
        GeocodingCandidate {
            name: name.to_string(),
            latitude: 33.66,
            longitude: -95.55,
            admin1: admin1.map(str::to_string),
            country_code: Some(country_code.to_string()),
            timezone: Some("America/Chicago".to_string()),
        }
    }

    #[test]
    fn test_empty_candidates() {
        assert!(select_candidate(&[], None).is_none());
        assert!(select_candidate(&[], Some("TX")).is_none());
    }

    #[test]
    fn test_region_hint_prefers_matching_admin1() {
        let candidates = vec![
            candidate("Paris", Some("Île-de-France"), "FR"),
            candidate("Paris", Some("Texas"), "US"),
        ];

        let selected = select_candidate(&candidates, Some("TX")).unwrap();
        assert_eq!(selected.admin1.as_deref(), Some("Texas"));

        let selected = select_candidate(&candidates, Some("texas")).unwrap();
        assert_eq!(selected.admin1.as_deref(), Some("Texas"));

        let selected = select_candidate(&candidates, Some("Île")).unwrap();
        assert_eq!(selected.admin1.as_deref(), Some("Île-de-France"));
    }

    #[test]
    fn test_region_hint_matches_country_code() {
        let candidates = vec![
            candidate("Paris", Some("Île-de-France"), "FR"),
            candidate("Paris", Some("Ontario"), "CA"),
        ];
        let selected = select_candidate(&candidates, Some("ca")).unwrap();
        assert_eq!(selected.admin1.as_deref(), Some("Ontario"));
    }

    #[test]
    fn test_state_code_lookup() {
        assert_eq!(us_state_name("ks"), Some("Kansas"));
        assert_eq!(us_state_name(" TX "), Some("Texas"));
        assert_eq!(us_state_name("XX"), None);
    }

    #[test]
    fn test_without_hint_selects_first() {
        let candidates = vec![
            candidate("Springfield", Some("Illinois"), "US"),
            candidate("Springfield", Some("Missouri"), "US"),
        ];
        let selected = select_candidate(&candidates, None).unwrap();
        assert_eq!(selected.admin1.as_deref(), Some("Illinois"));
    }

    #[test]
    fn test_unmatched_hint_falls_back_to_first() {
        let candidates = vec![candidate("Galena", Some("Kansas"), "US")];
        let selected = select_candidate(&candidates, Some("Nowhere")).unwrap();
        assert_eq!(selected.name, "Galena");
    }

    #[test]
    fn test_candidate_to_location() {
        let location = ResolvedLocation::from(&candidate("Paris", Some("Texas"), "US"));
        assert_eq!(location.display_name, "Paris, Texas");
        assert_eq!(location.timezone_id, "America/Chicago");

        let mut bare = candidate("Nauru", None, "NR");
        bare.timezone = None;
        let location = ResolvedLocation::from(&bare);
        assert_eq!(location.display_name, "Nauru");
        assert_eq!(location.timezone_id, "UTC");
    }

    #[test]
    fn test_response_without_results_key() {
        let body: openmeteo::GeocodingResponse =
            serde_json::from_str(r#"{"generationtime_ms":0.5}"#).unwrap();
        assert!(body.results.is_none());
    }

    #[test]
    fn test_candidate_missing_coordinates_is_malformed() {
        let result: std::result::Result<openmeteo::GeocodingResponse, _> =
            serde_json::from_str(r#"{"results":[{"name":"Paris"}]}"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_manual_coordinates_need_no_network() {
        let mut config = SentinelConfig::default();
        // Unroutable endpoint: any request would fail
        config.endpoints.geocoding_url = "http://127.0.0.1:9".to_string();
        let resolver = GeocodeResolver::new(Client::new(), &config);

        let query = LocationQuery::coordinates(37.0759, -94.6394).unwrap();
        let location = resolver.resolve(&query).await.unwrap();
        assert_eq!(location.display_name, "Point (37.0759, -94.6394)");
        assert_eq!(location.timezone_id, "UTC");
    }

    #[tokio::test]
    async fn test_empty_name_is_not_found() {
        let resolver = GeocodeResolver::new(Client::new(), &SentinelConfig::default());
        let result = resolver.resolve(&LocationQuery::ByName("  ".to_string())).await;
        assert!(matches!(result, Err(SentinelError::LocationNotFound { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_not_found() {
        let mut config = SentinelConfig::default();
        config.endpoints.geocoding_url = "http://127.0.0.1:9".to_string();
        let resolver = GeocodeResolver::new(Client::new(), &config);

        let result = resolver
            .resolve(&LocationQuery::ByName("Galena, KS".to_string()))
            .await;
        assert!(matches!(result, Err(SentinelError::LocationNotFound { .. })));
    }
}
