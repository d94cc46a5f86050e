use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;

use crate::config::SentinelConfig;

const NOTE_TITLE: &str = "PROJECT SENTINEL";

/// Result of a single dispatch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// No access token configured, nothing was sent
    Skipped,
    Sent,
    /// The push relay could not be reached or refused the note
    Failed(String),
}

impl NotificationOutcome {
    /// Notice to show the user after a dispatch attempt
    #[must_use]
    pub fn user_notice(&self) -> String {
        match self {
            NotificationOutcome::Skipped => {
                "No push token configured; notification skipped".to_string()
            }
            NotificationOutcome::Sent => "Signal transmitted".to_string(),
            NotificationOutcome::Failed(reason) => format!("Connection failed: {reason}"),
        }
    }
}

#[derive(Debug, Serialize)]
struct PushNote<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'a str,
    body: String,
}

/// Sends alert notes through the Pushbullet push relay
pub struct NotificationDispatcher {
    client: Client,
    push_url: String,
}

/// Message body embedding the score (one decimal) and the location name
#[must_use]
pub fn format_alert_message(score: f64, display_name: &str) -> String {
    format!("SENTINEL ALERT: {score:.1}% Vortex Probability in {display_name}!")
}

impl NotificationDispatcher {
    #[must_use]
    pub fn new(client: Client, config: &SentinelConfig) -> Self {
        Self {
            client,
            push_url: config.endpoints.push_url.clone(),
        }
    }

    /// Transmit one alert note. Never fails; problems come back as
    /// [`NotificationOutcome::Failed`].
    pub async fn dispatch(
        &self,
        token: Option<&str>,
        score: f64,
        display_name: &str,
    ) -> NotificationOutcome {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            tracing::debug!("No push token, skipping notification");
            return NotificationOutcome::Skipped;
        };

        match self.send_note(token, score, display_name).await {
            Ok(()) => {
                tracing::info!("Sent push notification for {}", display_name);
                NotificationOutcome::Sent
            }
            Err(e) => {
                tracing::warn!("Push notification failed: {:#}", e);
                NotificationOutcome::Failed(format!("{e:#}"))
            }
        }
    }

    async fn send_note(&self, token: &str, score: f64, display_name: &str) -> Result<()> {
        let note = PushNote {
            kind: "note",
            title: NOTE_TITLE,
            body: format_alert_message(score, display_name),
        };

        self.client
            .post(self.push_url.as_str())
            .header("Access-Token", token)
            .json(&note)
            .send()
            .await
            .context("Failed to reach push relay")?
            .error_for_status()
            .context("Push relay rejected the note")?;

        Ok(())
    }
}
