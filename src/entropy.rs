//! Entropy sampling
//!
//! Requests a handful of `uint8` values from the ANU quantum random number
//! service and reduces them to a single scalar with [`variance_scalar`]. The
//! value is an opaque input to the risk score and carries no claim of
//! randomness quality.

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::config::SentinelConfig;
use crate::models::EntropySample;
use crate::risk::variance_scalar;

pub struct EntropyFetcher {
    client: Client,
    base_url: String,
    sample_length: u32,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RandomBytesResponse {
    data: Vec<u8>,
    success: Option<bool>,
}

impl EntropyFetcher {
    #[must_use]
    pub fn new(client: Client, config: &SentinelConfig) -> Self {
        Self {
            client,
            base_url: config.endpoints.entropy_url.clone(),
            sample_length: config.entropy.sample_length,
            timeout: config.http.entropy_timeout(),
        }
    }

    /// Fetch a fresh sample, or the fallback scalar if the service is down
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> EntropySample {
        match self.fetch_live().await {
            Ok(sample) => {
                debug!("Entropy scalar: {:.4}", sample.variance_scalar);
                sample
            }
            Err(e) => {
                warn!("Entropy source unavailable, using fallback scalar: {:#}", e);
                EntropySample::fallback()
            }
        }
    }

    async fn fetch_live(&self) -> Result<EntropySample> {
        let url = format!(
            "{}?length={}&type=uint8",
            self.base_url, self.sample_length
        );
        debug!("Entropy request URL: {}", url);

        let body = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_sample(&body)
    }
}

/// Parse a raw random-byte payload into a sample
pub fn parse_sample(body: &str) -> Result<EntropySample> {
    let response: RandomBytesResponse =
        serde_json::from_str(body).with_context(|| "Failed to parse random byte response")?;

    if response.success == Some(false) {
        bail!("Random byte service reported failure");
    }

    let scalar =
        variance_scalar(&response.data).ok_or_else(|| anyhow!("Random byte response was empty"))?;
    Ok(EntropySample::live(scalar))
}
