//! Output of one refresh cycle

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::{AtmosphereReading, EntropySample, ResolvedLocation};
use crate::risk::RiskAssessment;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub location: ResolvedLocation,
    pub atmosphere: AtmosphereReading,
    pub entropy: EntropySample,
    pub assessment: RiskAssessment,
    /// Whether the readings were served from the cache
    pub from_cache: bool,
    pub generated_at: DateTime<Utc>,
    /// Generation time in the location's timezone, `None` when the id is not
    /// a known IANA zone
    #[serde(default)]
    pub local_time: Option<String>,
}

impl RiskReport {
    /// Assemble the report for one cycle, scoring the readings
    #[must_use]
    pub fn new(
        location: ResolvedLocation,
        atmosphere: AtmosphereReading,
        entropy: EntropySample,
        from_cache: bool,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let assessment = RiskAssessment::from_readings(&atmosphere, &entropy);
        let local_time = format_local_time(&location.timezone_id, generated_at);
        Self {
            location,
            atmosphere,
            entropy,
            assessment,
            from_cache,
            generated_at,
            local_time,
        }
    }

    /// Multi-line text rendering for the terminal
    #[must_use]
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("SENTINEL: {}", self.location.display_name),
            format!("  Coordinates : {}", self.location.format_coordinates()),
            format!("  Timezone    : {}", self.location.timezone_id),
        ];
        if let Some(local) = &self.local_time {
            lines.push(format!("  Local time  : {local}"));
        }
        lines.push(format!(
            "  Pressure    : {}{}",
            self.atmosphere.format_pressure(),
            fallback_marker(self.atmosphere.source)
        ));
        lines.push(format!("  Wind        : {}", self.atmosphere.format_wind()));
        lines.push(format!(
            "  Entropy     : {:.4}{}",
            self.entropy.variance_scalar,
            fallback_marker(self.entropy.source)
        ));
        lines.push(format!(
            "  Risk level  : {} [{}] {}",
            self.assessment.format_score(),
            gauge(self.assessment.gauge_level()),
            self.assessment.tier
        ));
        lines.join("\n")
    }
}

fn format_local_time(timezone_id: &str, at: DateTime<Utc>) -> Option<String> {
    let tz: Tz = timezone_id.parse().ok()?;
    Some(
        at.with_timezone(&tz)
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string(),
    )
}

fn fallback_marker(source: super::ReadingSource) -> &'static str {
    match source {
        super::ReadingSource::Live => "",
        super::ReadingSource::Fallback => " (fallback)",
    }
}

fn gauge(level: u8) -> String {
    let filled = usize::from(level / 5);
    format!("{}{}", "#".repeat(filled), "-".repeat(20 - filled))
}
