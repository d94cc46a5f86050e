//! `Sentinel` - atmospheric pressure and entropy risk monitor
//!
//! This library resolves a location, reads surface pressure and an external
//! entropy sample for it, and combines both into a bounded risk score with an
//! alert tier. Unavailable upstreams degrade to fixed fallback constants.

pub mod cache;
pub mod config;
pub mod entropy;
pub mod error;
pub mod geocoding;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod risk;
pub mod weather;

// Re-export core types for public API
pub use cache::FixedWindowCache;
pub use config::SentinelConfig;
pub use entropy::EntropyFetcher;
pub use error::SentinelError;
pub use geocoding::GeocodeResolver;
pub use models::{AtmosphereReading, EntropySample, LocationQuery, ResolvedLocation, RiskReport};
pub use notify::{NotificationDispatcher, NotificationOutcome};
pub use pipeline::Pipeline;
pub use risk::{RiskAssessment, RiskTier};
pub use weather::AtmosphereFetcher;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SentinelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
