use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{config::Config, error::LocationError, model::Coordinates};

use super::LocationProbe;

/// Network location provider: resolves coordinates from the public IP address.
#[derive(Debug, Clone)]
pub struct IpLocator {
    url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl IpLocator {
    pub fn new(url: impl Into<String>, http: Client) -> Self {
        Self { url: url.into(), http }
    }

    pub async fn locate(&self) -> Result<Coordinates, LocationError> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| LocationError::Lookup(format!("IP lookup request failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            return Err(LocationError::Lookup(format!("IP lookup failed with status {status}")));
        }

        let parsed: IpLookupResponse = res
            .json()
            .await
            .map_err(|e| LocationError::Lookup(format!("Failed to parse IP lookup JSON: {e}")))?;

        match (parsed.status.as_str(), parsed.lat, parsed.lon) {
            ("success", Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(LocationError::Lookup(
                parsed.message.unwrap_or_else(|| format!("IP lookup returned {}", parsed.status)),
            )),
        }
    }
}

/// Location probe with a fixed provider and an optional network provider.
///
/// Fixed coordinates win when both are enabled.
#[derive(Debug, Clone, Default)]
pub struct DeviceLocationProbe {
    fixed: Option<Coordinates>,
    network: Option<IpLocator>,
}

impl DeviceLocationProbe {
    pub fn new(fixed: Option<Coordinates>, network: Option<IpLocator>) -> Self {
        Self { fixed, network }
    }

    /// Build the probe from the `[location]` section, sharing the HTTP timeout.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let location = &config.location;
        let network = if location.ip_lookup {
            let http = Client::builder()
                .timeout(config.http_timeout())
                .build()
                .context("Failed to build HTTP client for IP lookup")?;
            Some(IpLocator::new(location.ip_lookup_url.clone(), http))
        } else {
            None
        };

        Ok(Self::new(location.fixed_coordinates(), network))
    }
}

#[async_trait]
impl LocationProbe for DeviceLocationProbe {
    fn is_location_enabled(&self) -> bool {
        self.fixed.is_some() || self.network.is_some()
    }

    async fn request_current_location(&self) -> Result<Coordinates, LocationError> {
        if let Some(coords) = self.fixed {
            tracing::debug!(?coords, "using fixed location");
            return Ok(coords);
        }

        match &self.network {
            Some(locator) => {
                let coords = locator.locate().await?;
                tracing::debug!(?coords, "resolved location from IP address");
                Ok(coords)
            }
            None => Err(LocationError::ProviderDisabled),
        }
    }
}
