//! Risk scoring
//!
//! Combines the pressure deficit below standard sea-level pressure with the
//! entropy scalar into a score in `[0, 100]` and classifies it. Everything in
//! here is pure, so it can be tested without touching the network.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{AtmosphereReading, EntropySample};

/// Reference pressure the deficit is measured against, in hPa
pub const REFERENCE_PRESSURE_HPA: f64 = 1013.25;
/// Multiplier applied to `pressure_drop * variance_scalar`
pub const RISK_MULTIPLIER: f64 = 2.0;
/// Divisor mapping the raw byte variance into roughly `[0, 1]`
pub const VARIANCE_NORMALIZATION: f64 = 1000.0;
/// Scores strictly above this are HIGH ALERT
pub const HIGH_ALERT_THRESHOLD: f64 = 50.0;
/// Scores strictly above this (and not HIGH ALERT) are CAUTION
pub const CAUTION_THRESHOLD: f64 = 20.0;

pub const MIN_RISK: f64 = 0.0;
pub const MAX_RISK: f64 = 100.0;

/// Classification of a risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    /// risk <= 20
    Stable,
    /// 20 < risk <= 50
    Caution,
    /// risk > 50
    HighAlert,
}

impl RiskTier {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Stable => "STABLE",
            RiskTier::Caution => "CAUTION",
            RiskTier::HighAlert => "HIGH ALERT",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Score and tier for one refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub tier: RiskTier,
}

impl RiskAssessment {
    #[must_use]
    pub fn from_readings(atmosphere: &AtmosphereReading, entropy: &EntropySample) -> Self {
        let score = compute_risk(atmosphere.pressure_hpa, entropy.variance_scalar);
        Self {
            score,
            tier: classify(score),
        }
    }

    /// Whole-percent gauge level, capped at 100
    #[must_use]
    pub fn gauge_level(&self) -> u8 {
        self.score.clamp(MIN_RISK, MAX_RISK) as u8
    }

    /// Format the score as a percentage with one decimal
    #[must_use]
    pub fn format_score(&self) -> String {
        format!("{:.1}%", self.score)
    }
}

/// Pressure deficit below the reference pressure, never negative
#[must_use]
pub fn pressure_drop(pressure_hpa: f64) -> f64 {
    (REFERENCE_PRESSURE_HPA - pressure_hpa).max(0.0)
}

/// Compute the bounded risk score.
///
/// Non-finite inputs score 0.
#[must_use]
pub fn compute_risk(pressure_hpa: f64, variance_scalar: f64) -> f64 {
    if !pressure_hpa.is_finite() || !variance_scalar.is_finite() {
        return MIN_RISK;
    }
    let raw = pressure_drop(pressure_hpa) * variance_scalar * RISK_MULTIPLIER;
    raw.clamp(MIN_RISK, MAX_RISK)
}

/// Map a score to its tier
#[must_use]
pub fn classify(score: f64) -> RiskTier {
    if score > HIGH_ALERT_THRESHOLD {
        RiskTier::HighAlert
    } else if score > CAUTION_THRESHOLD {
        RiskTier::Caution
    } else {
        RiskTier::Stable
    }
}

/// Population variance of the byte sample divided by the normalization
/// constant. `None` for an empty sample.
#[must_use]
pub fn variance_scalar(bytes: &[u8]) -> Option<f64> {
    if bytes.is_empty() {
        return None;
    }

    let n = bytes.len() as f64;
    let mean = bytes.iter().map(|&b| f64::from(b)).sum::<f64>() / n;
    let variance = bytes
        .iter()
        .map(|&b| {
            let delta = f64::from(b) - mean;
            delta * delta
        })
        .sum::<f64>()
        / n;

    Some(variance / VARIANCE_NORMALIZATION)
}
