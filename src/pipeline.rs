//! Refresh cycle
//!
//! Ties the resolver, both fetchers, the reading cache and the risk engine
//! together. One call to [`Pipeline::refresh`] is one render cycle.

use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::SentinelError;
use crate::cache::FixedWindowCache;
use crate::config::SentinelConfig;
use crate::entropy::EntropyFetcher;
use crate::geocoding::GeocodeResolver;
use crate::models::{AtmosphereReading, EntropySample, LocationQuery, RiskReport};
use crate::notify::{NotificationDispatcher, NotificationOutcome};
use crate::risk::RiskTier;
use crate::weather::AtmosphereFetcher;

/// Readings cached together per location
#[derive(Debug, Clone)]
struct CachedReadings {
    atmosphere: AtmosphereReading,
    entropy: EntropySample,
}

pub struct Pipeline {
    resolver: GeocodeResolver,
    atmosphere: AtmosphereFetcher,
    entropy: EntropyFetcher,
    notifier: NotificationDispatcher,
    cache: FixedWindowCache<CachedReadings>,
    notify_token: Option<String>,
    notify_on_high_alert: bool,
    /// Tier of the last report checked for auto-notification
    last_tier: Option<RiskTier>,
}

impl Pipeline {
    /// Build the pipeline and its shared HTTP client
    pub fn new(config: &SentinelConfig) -> Result<Self, SentinelError> {
        let client = Client::builder()
            .timeout(config.http.timeout())
            .user_agent(config.http.user_agent.clone())
            .build()?;

        Ok(Self {
            resolver: GeocodeResolver::new(client.clone(), config),
            atmosphere: AtmosphereFetcher::new(client.clone(), config),
            entropy: EntropyFetcher::new(client.clone(), config),
            notifier: NotificationDispatcher::new(client, config),
            cache: FixedWindowCache::new(Duration::from_secs(config.cache.ttl_seconds)),
            notify_token: config.notify.token.clone(),
            notify_on_high_alert: config.notify.on_high_alert,
            last_tier: None,
        })
    }

    /// Run one refresh cycle.
    ///
    /// Only an unresolvable location fails; unavailable readings are replaced
    /// by their fallback constants.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self, query: &LocationQuery) -> Result<RiskReport, SentinelError> {
        let location = self.resolver.resolve(query).await?;
        let key = location.cache_key();

        let (readings, from_cache) = match self.cache.get(&key) {
            Some(readings) => {
                debug!("Using cached readings for {}", key);
                (readings, true)
            }
            None => {
                let atmosphere = self
                    .atmosphere
                    .fetch(location.latitude, location.longitude)
                    .await;
                let entropy = self.entropy.fetch().await;
                let readings = CachedReadings {
                    atmosphere,
                    entropy,
                };
                self.cache.put(&key, readings.clone());
                (readings, false)
            }
        };

        let report = RiskReport::new(
            location,
            readings.atmosphere,
            readings.entropy,
            from_cache,
            Utc::now(),
        );
        info!(
            "Risk for {}: {} ({})",
            report.location.display_name,
            report.assessment.format_score(),
            report.assessment.tier
        );

        Ok(report)
    }

    /// Send the report's score through the push relay.
    ///
    /// `token` overrides the configured token when given.
    pub async fn notify(&self, report: &RiskReport, token: Option<&str>) -> NotificationOutcome {
        let token = token.or(self.notify_token.as_deref());
        self.notifier
            .dispatch(token, report.assessment.score, &report.location.display_name)
            .await
    }

    /// Whether this report should trigger an automatic notification.
    ///
    /// Fires when the tier enters HIGH ALERT; consecutive HIGH ALERT reports
    /// after the first do not fire again.
    pub fn should_auto_notify(&mut self, report: &RiskReport) -> bool {
        let tier = report.assessment.tier;
        let previous = self.last_tier.replace(tier);
        self.notify_on_high_alert
            && tier == RiskTier::HighAlert
            && previous != Some(RiskTier::HighAlert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskAssessment;

    fn offline_config() -> SentinelConfig {
        let mut config = SentinelConfig::default();
        config.endpoints.geocoding_url = "http://127.0.0.1:9/v1/search".to_string();
        config.endpoints.forecast_url = "http://127.0.0.1:9/v1/forecast".to_string();
        config.endpoints.entropy_url = "http://127.0.0.1:9/API/jsonI.php".to_string();
        config.endpoints.push_url = "http://127.0.0.1:9/v2/pushes".to_string();
        config
    }

    #[tokio::test]
    async fn test_offline_refresh_uses_fallbacks() {
        let mut pipeline = Pipeline::new(&offline_config()).unwrap();
        let query = LocationQuery::coordinates(37.0759, -94.6394).unwrap();

        let report = pipeline.refresh(&query).await.unwrap();
        assert_eq!(report.atmosphere, AtmosphereReading::fallback());
        assert_eq!(report.entropy, EntropySample::fallback());
        assert_eq!(report.assessment.score, 0.0);
        assert_eq!(report.assessment.tier, RiskTier::Stable);
        assert!(!report.from_cache);

        let again = pipeline.refresh(&query).await.unwrap();
        assert!(again.from_cache);
    }

    #[tokio::test]
    async fn test_unknown_location_halts_cycle() {
        let mut pipeline = Pipeline::new(&offline_config()).unwrap();
        let result = pipeline
            .refresh(&LocationQuery::ByName("Galena, KS".to_string()))
            .await;
        assert!(matches!(result, Err(SentinelError::LocationNotFound { .. })));
    }

    fn with_tier(report: &RiskReport, score: f64, tier: RiskTier) -> RiskReport {
        let mut report = report.clone();
        report.assessment = RiskAssessment { score, tier };
        report
    }

    #[tokio::test]
    async fn test_auto_notify_fires_on_entering_high_alert() {
        let mut config = offline_config();
        config.notify.on_high_alert = true;
        let mut pipeline = Pipeline::new(&config).unwrap();
        let query = LocationQuery::coordinates(1.0, 2.0).unwrap();

        let stable = pipeline.refresh(&query).await.unwrap();
        let high = with_tier(&stable, 75.0, RiskTier::HighAlert);
        let caution = with_tier(&stable, 30.0, RiskTier::Caution);

        assert!(!pipeline.should_auto_notify(&stable));
        assert!(pipeline.should_auto_notify(&high));
        assert!(!pipeline.should_auto_notify(&high));
        assert!(!pipeline.should_auto_notify(&high));
        assert!(!pipeline.should_auto_notify(&caution));
        assert!(pipeline.should_auto_notify(&high));

        assert_eq!(
            pipeline.notify(&high, None).await,
            NotificationOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_first_report_in_high_alert_fires() {
        let mut config = offline_config();
        config.notify.on_high_alert = true;
        let mut pipeline = Pipeline::new(&config).unwrap();
        let query = LocationQuery::coordinates(1.0, 2.0).unwrap();

        let report = pipeline.refresh(&query).await.unwrap();
        assert!(pipeline.should_auto_notify(&with_tier(&report, 100.0, RiskTier::HighAlert)));
    }

    #[tokio::test]
    async fn test_auto_notify_disabled_never_fires() {
        let mut pipeline = Pipeline::new(&offline_config()).unwrap();
        let query = LocationQuery::coordinates(1.0, 2.0).unwrap();

        let report = pipeline.refresh(&query).await.unwrap();
        let high = with_tier(&report, 75.0, RiskTier::HighAlert);
        assert!(!pipeline.should_auto_notify(&report));
        assert!(!pipeline.should_auto_notify(&high));
    }
}
